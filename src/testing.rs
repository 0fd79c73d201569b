//! In-memory repositories and a recording mailer for handler tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};

use crate::app::AppState;
use crate::config::{AdminAuthConfig, EmailConfig};
use crate::db::blog_repository::BlogRepository;
use crate::db::models::{
    Blog, BlogChanges, Page, PageChanges, PageSlug, SettingsChanges, SiteSettings, Testimonial,
};
use crate::db::page_repository::{page_exists_message, PageRepository};
use crate::db::settings_repository::SettingsRepository;
use crate::db::testimonial_repository::TestimonialRepository;
use crate::email::mailer::{EmailError, Mailer, OutgoingEmail};
use crate::email::service::EmailService;
use crate::error::AppError;
use crate::events::TestimonialEvents;

#[derive(Default)]
pub struct MemBlogRepo {
    pub blogs: Mutex<Vec<Blog>>,
}

#[async_trait]
impl BlogRepository for MemBlogRepo {
    async fn list(&self, published: Option<bool>) -> Result<Vec<Blog>, AppError> {
        let mut blogs: Vec<Blog> = self
            .blogs
            .lock()
            .unwrap()
            .iter()
            .filter(|b| published.map_or(true, |p| b.published == p))
            .cloned()
            .collect();
        blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(blogs)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Blog>, AppError> {
        Ok(self.blogs.lock().unwrap().iter().find(|b| b.id == Some(id)).cloned())
    }

    async fn insert(&self, mut blog: Blog) -> Result<Blog, AppError> {
        blog.id = Some(ObjectId::new());
        self.blogs.lock().unwrap().push(blog.clone());
        Ok(blog)
    }

    async fn update(
        &self,
        id: ObjectId,
        changes: BlogChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Blog>, AppError> {
        let mut blogs = self.blogs.lock().unwrap();
        let Some(blog) = blogs.iter_mut().find(|b| b.id == Some(id)) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            blog.title = title;
        }
        if let Some(category) = changes.category {
            blog.category = category;
        }
        if let Some(content) = changes.content {
            blog.content = content;
        }
        if let Some(source) = changes.source {
            blog.source = source;
        }
        if let Some(published) = changes.published {
            blog.published = published;
        }
        blog.updated_at = now;
        Ok(Some(blog.clone()))
    }

    async fn toggle_published(
        &self,
        id: ObjectId,
        now: DateTime<Utc>,
    ) -> Result<Option<Blog>, AppError> {
        let mut blogs = self.blogs.lock().unwrap();
        Ok(blogs.iter_mut().find(|b| b.id == Some(id)).map(|blog| {
            blog.published = !blog.published;
            blog.updated_at = now;
            blog.clone()
        }))
    }

    async fn delete(&self, id: ObjectId) -> Result<Option<Blog>, AppError> {
        let mut blogs = self.blogs.lock().unwrap();
        let position = blogs.iter().position(|b| b.id == Some(id));
        Ok(position.map(|i| blogs.remove(i)))
    }
}

#[derive(Default)]
pub struct MemPageRepo {
    pub pages: Mutex<Vec<Page>>,
}

#[async_trait]
impl PageRepository for MemPageRepo {
    async fn list(&self) -> Result<Vec<Page>, AppError> {
        let mut pages = self.pages.lock().unwrap().clone();
        pages.sort_by_key(|p| p.slug);
        Ok(pages)
    }

    async fn find_by_slug(&self, slug: PageSlug) -> Result<Option<Page>, AppError> {
        Ok(self.pages.lock().unwrap().iter().find(|p| p.slug == slug).cloned())
    }

    async fn insert(&self, mut page: Page) -> Result<Page, AppError> {
        let mut pages = self.pages.lock().unwrap();
        if pages.iter().any(|p| p.slug == page.slug) {
            return Err(AppError::BadRequest(page_exists_message(page.slug.as_str())));
        }
        page.id = Some(ObjectId::new());
        pages.push(page.clone());
        Ok(page)
    }

    async fn update(
        &self,
        slug: PageSlug,
        changes: PageChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Page>, AppError> {
        let mut pages = self.pages.lock().unwrap();
        Ok(pages.iter_mut().find(|p| p.slug == slug).map(|page| {
            if let Some(title) = changes.title {
                page.title = title;
            }
            if let Some(content) = changes.content {
                page.content = content;
            }
            if let Some(meta) = changes.meta {
                page.meta = meta;
            }
            page.updated_at = now;
            page.clone()
        }))
    }

    async fn delete(&self, slug: PageSlug) -> Result<Option<Page>, AppError> {
        let mut pages = self.pages.lock().unwrap();
        let position = pages.iter().position(|p| p.slug == slug);
        Ok(position.map(|i| pages.remove(i)))
    }
}

#[derive(Default)]
pub struct MemSettingsRepo {
    pub settings: Mutex<Option<SiteSettings>>,
}

#[async_trait]
impl SettingsRepository for MemSettingsRepo {
    async fn get_settings(&self) -> Result<SiteSettings, AppError> {
        let mut settings = self.settings.lock().unwrap();
        Ok(settings
            .get_or_insert_with(|| SiteSettings {
                id: Some(ObjectId::new()),
                ..SiteSettings::with_defaults(Utc::now())
            })
            .clone())
    }

    async fn update_settings(
        &self,
        changes: SettingsChanges,
        now: DateTime<Utc>,
    ) -> Result<SiteSettings, AppError> {
        let mut guard = self.settings.lock().unwrap();
        let settings = guard.get_or_insert_with(|| SiteSettings {
            id: Some(ObjectId::new()),
            ..SiteSettings::with_defaults(now)
        });
        if let Some(v) = changes.years_of_experience {
            settings.years_of_experience = v;
        }
        if let Some(v) = changes.happy_clients {
            settings.happy_clients = v;
        }
        if let Some(v) = changes.client_satisfaction {
            settings.client_satisfaction = v;
        }
        if let Some(v) = changes.properties_managed {
            settings.properties_managed = v;
        }
        if let Some(v) = changes.company_founded_year {
            settings.company_founded_year = v;
        }
        settings.updated_at = now;
        Ok(settings.clone())
    }
}

#[derive(Default)]
pub struct MemTestimonialRepo {
    pub testimonials: Mutex<Vec<Testimonial>>,
}

#[async_trait]
impl TestimonialRepository for MemTestimonialRepo {
    async fn list(&self, approved: Option<bool>) -> Result<Vec<Testimonial>, AppError> {
        let mut items: Vec<Testimonial> = self
            .testimonials
            .lock()
            .unwrap()
            .iter()
            .filter(|t| approved.map_or(true, |a| t.approved == a))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn insert(&self, mut testimonial: Testimonial) -> Result<Testimonial, AppError> {
        testimonial.id = Some(ObjectId::new());
        self.testimonials.lock().unwrap().push(testimonial.clone());
        Ok(testimonial)
    }

    async fn approve(&self, id: ObjectId) -> Result<Option<Testimonial>, AppError> {
        let mut items = self.testimonials.lock().unwrap();
        Ok(items.iter_mut().find(|t| t.id == Some(id)).map(|t| {
            t.approved = true;
            t.clone()
        }))
    }

    async fn delete(&self, id: ObjectId) -> Result<Option<Testimonial>, AppError> {
        let mut items = self.testimonials.lock().unwrap();
        let position = items.iter().position(|t| t.id == Some(id));
        Ok(position.map(|i| items.remove(i)))
    }
}

/// Captures outgoing mail instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub fn email_config() -> EmailConfig {
    EmailConfig {
        api_key: None,
        api_url: "http://localhost".to_string(),
        from: "hello@modernservices.org.uk".to_string(),
        contact_email: "info@modernservices.org.uk".to_string(),
        company_name: "Modern Services".to_string(),
        admin_dashboard_url: "http://localhost:5173/admin".to_string(),
        timeout: Duration::from_secs(15),
    }
}

pub fn email_service(mailer: Arc<dyn Mailer>) -> Arc<EmailService> {
    Arc::new(EmailService::new(mailer, email_config()).unwrap())
}

/// Application state backed entirely by in-memory fakes.
pub fn test_state(mailer: Arc<dyn Mailer>) -> AppState {
    AppState {
        blog_repo: Arc::new(MemBlogRepo::default()),
        page_repo: Arc::new(MemPageRepo::default()),
        settings_repo: Arc::new(MemSettingsRepo::default()),
        testimonial_repo: Arc::new(MemTestimonialRepo::default()),
        email: email_service(mailer),
        events: TestimonialEvents::default(),
        auth: AdminAuthConfig::disabled(),
    }
}
