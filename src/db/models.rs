use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Blog post categories offered by the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlogCategory {
    Tax,
    Property,
    Employment,
    #[serde(rename = "Leisure & Hospitality")]
    LeisureHospitality,
    #[serde(rename = "Financial Services")]
    FinancialServices,
    Energy,
    Other,
}

impl BlogCategory {
    pub const ALL: [BlogCategory; 7] = [
        BlogCategory::Tax,
        BlogCategory::Property,
        BlogCategory::Employment,
        BlogCategory::LeisureHospitality,
        BlogCategory::FinancialServices,
        BlogCategory::Energy,
        BlogCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlogCategory::Tax => "Tax",
            BlogCategory::Property => "Property",
            BlogCategory::Employment => "Employment",
            BlogCategory::LeisureHospitality => "Leisure & Hospitality",
            BlogCategory::FinancialServices => "Financial Services",
            BlogCategory::Energy => "Energy",
            BlogCategory::Other => "Other",
        }
    }

    /// Parse a category label. Matching is exact after trimming.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for BlogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blog post as stored in the `blogs` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub category: BlogCategory,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Field changes for a blog post. `None` leaves a field untouched;
/// `source: Some(None)` removes the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub category: Option<BlogCategory>,
    pub content: Option<String>,
    pub source: Option<Option<String>>,
    pub published: Option<bool>,
}

/// Blog post as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogView {
    pub id: String,
    pub title: String,
    pub category: BlogCategory,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Blog> for BlogView {
    fn from(blog: Blog) -> Self {
        Self {
            id: hex_id(blog.id),
            title: blog.title,
            category: blog.category,
            content: blog.content,
            source: blog.source,
            published: blog.published,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }
}

/// The site pages whose copy is editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSlug {
    About,
    Contact,
    Home,
    Services,
    Testimonials,
}

impl PageSlug {
    pub const ALL: [PageSlug; 5] = [
        PageSlug::About,
        PageSlug::Contact,
        PageSlug::Home,
        PageSlug::Services,
        PageSlug::Testimonials,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageSlug::About => "about",
            PageSlug::Contact => "contact",
            PageSlug::Home => "home",
            PageSlug::Services => "services",
            PageSlug::Testimonials => "testimonials",
        }
    }

    /// Parse a slug (case-insensitive).
    pub fn from_str_ci(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for PageSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional SEO metadata attached to a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

/// An editable page as stored in the `pages` collection.
///
/// `content` is free-form JSON; each page's frontend decides its shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub slug: PageSlug,
    pub title: String,
    pub content: serde_json::Value,
    #[serde(default)]
    pub meta: PageMeta,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageChanges {
    pub title: Option<String>,
    pub content: Option<serde_json::Value>,
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub id: String,
    pub slug: PageSlug,
    pub title: String,
    pub content: serde_json::Value,
    pub meta: PageMeta,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Page> for PageView {
    fn from(page: Page) -> Self {
        Self {
            id: hex_id(page.id),
            slug: page.slug,
            title: page.title,
            content: page.content,
            meta: page.meta,
            created_at: page.created_at,
            updated_at: page.updated_at,
        }
    }
}

/// Key of the single site-settings document.
pub const SETTINGS_KEY: &str = "global";

/// Site-wide statistics shown on the marketing pages.
///
/// The collection holds exactly one document, addressed by `key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default = "default_settings_key")]
    pub key: String,
    #[serde(default = "default_years_of_experience")]
    pub years_of_experience: String,
    #[serde(default = "default_happy_clients")]
    pub happy_clients: String,
    #[serde(default = "default_client_satisfaction")]
    pub client_satisfaction: String,
    #[serde(default = "default_properties_managed")]
    pub properties_managed: String,
    #[serde(default = "default_company_founded_year")]
    pub company_founded_year: i32,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_settings_key() -> String {
    SETTINGS_KEY.to_string()
}

pub fn default_years_of_experience() -> String {
    "10+".to_string()
}

pub fn default_happy_clients() -> String {
    "56+".to_string()
}

pub fn default_client_satisfaction() -> String {
    "98%".to_string()
}

pub fn default_properties_managed() -> String {
    "50+".to_string()
}

pub fn default_company_founded_year() -> i32 {
    2014
}

impl SiteSettings {
    /// A fresh settings document with the stock figures.
    pub fn with_defaults(now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            key: default_settings_key(),
            years_of_experience: default_years_of_experience(),
            happy_clients: default_happy_clients(),
            client_satisfaction: default_client_satisfaction(),
            properties_managed: default_properties_managed(),
            company_founded_year: default_company_founded_year(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsChanges {
    pub years_of_experience: Option<String>,
    pub happy_clients: Option<String>,
    pub client_satisfaction: Option<String>,
    pub properties_managed: Option<String>,
    pub company_founded_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettingsView {
    pub id: String,
    pub years_of_experience: String,
    pub happy_clients: String,
    pub client_satisfaction: String,
    pub properties_managed: String,
    pub company_founded_year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SiteSettings> for SiteSettingsView {
    fn from(s: SiteSettings) -> Self {
        Self {
            id: hex_id(s.id),
            years_of_experience: s.years_of_experience,
            happy_clients: s.happy_clients,
            client_satisfaction: s.client_satisfaction,
            properties_managed: s.properties_managed,
            company_founded_year: s.company_founded_year,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// A customer testimonial as stored in the `testimonials` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub message: String,
    #[serde(default)]
    pub approved: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialView {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub message: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Testimonial> for TestimonialView {
    fn from(t: Testimonial) -> Self {
        Self {
            id: hex_id(t.id),
            name: t.name,
            email: t.email,
            location: t.location,
            message: t.message,
            approved: t.approved,
            created_at: t.created_at,
        }
    }
}

fn hex_id(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}
