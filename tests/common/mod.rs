#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;

use modern_services::app::{build_router, AppState};
use modern_services::config::{AdminAuthConfig, CorsPolicy, EmailConfig};
use modern_services::db::blog_repository::{BlogRepository, MongoBlogRepository};
use modern_services::db::connection;
use modern_services::db::page_repository::{MongoPageRepository, PageRepository};
use modern_services::db::settings_repository::{MongoSettingsRepository, SettingsRepository};
use modern_services::db::testimonial_repository::{
    MongoTestimonialRepository, TestimonialRepository,
};
use modern_services::email::mailer::{EmailError, Mailer, OutgoingEmail};
use modern_services::email::service::EmailService;
use modern_services::events::TestimonialEvents;

pub const ADMIN_EMAIL: &str = "admin@modernservices.com";
pub const ADMIN_PASSWORD: &str = "integration-password";

/// Captures outgoing mail instead of calling a provider.
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

/// Holds the running MongoDB container and the router wired to it.
///
/// The container lives as long as this struct. Each environment uses its
/// own database so tests never see each other's documents.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    pub db: mongodb::Database,
    pub router: Router,
    pub blog_repo: Arc<dyn BlogRepository>,
    pub page_repo: Arc<dyn PageRepository>,
    pub settings_repo: Arc<dyn SettingsRepository>,
    pub testimonial_repo: Arc<dyn TestimonialRepository>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestEnv {
    /// Start MongoDB with the admin guard off.
    pub async fn start() -> Self {
        Self::start_with(false).await
    }

    /// Start MongoDB with mutating routes requiring an admin session.
    pub async fn start_guarded() -> Self {
        Self::start_with(true).await
    }

    async fn start_with(require_admin: bool) -> Self {
        let mongo_container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");

        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);
        let mongo_client = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to connect to MongoDB");
        let db_name = format!("modern_services_test_{}", uuid::Uuid::new_v4().simple());
        let db = mongo_client.database(&db_name);
        connection::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");

        let blog_repo: Arc<dyn BlogRepository> = Arc::new(MongoBlogRepository::new(&db));
        let page_repo: Arc<dyn PageRepository> = Arc::new(MongoPageRepository::new(&db));
        let settings_repo: Arc<dyn SettingsRepository> =
            Arc::new(MongoSettingsRepository::new(&db));
        let testimonial_repo: Arc<dyn TestimonialRepository> =
            Arc::new(MongoTestimonialRepository::new(&db));

        let mailer = Arc::new(RecordingMailer::default());
        let email = EmailService::new(
            mailer.clone(),
            EmailConfig {
                api_key: None,
                api_url: "http://localhost".to_string(),
                from: "hello@modernservices.org.uk".to_string(),
                contact_email: "info@modernservices.org.uk".to_string(),
                company_name: "Modern Services".to_string(),
                admin_dashboard_url: "http://localhost:5173/admin".to_string(),
                timeout: Duration::from_secs(5),
            },
        )
        .expect("Failed to build email service");

        let state = AppState {
            blog_repo: blog_repo.clone(),
            page_repo: page_repo.clone(),
            settings_repo: settings_repo.clone(),
            testimonial_repo: testimonial_repo.clone(),
            email: Arc::new(email),
            events: TestimonialEvents::default(),
            auth: AdminAuthConfig {
                email: Some(ADMIN_EMAIL.to_string()),
                password: Some(ADMIN_PASSWORD.to_string()),
                require_for_writes: require_admin,
                ..AdminAuthConfig::disabled()
            },
        };

        let cors = CorsPolicy {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            allow_any_localhost: false,
        };
        let router = build_router(state, &cors);

        Self {
            _mongo: mongo_container,
            db,
            router,
            blog_repo,
            page_repo,
            settings_repo,
            testimonial_repo,
            mailer,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .build(self.router.clone())
    }

    /// Number of documents currently stored in `collection`.
    pub async fn count(&self, collection: &str) -> u64 {
        self.db
            .collection::<bson::Document>(collection)
            .count_documents(bson::doc! {})
            .await
            .expect("Failed to count documents")
    }

    /// Helper: create a blog post via the API and return its id.
    pub async fn create_blog(&self, server: &axum_test::TestServer, title: &str) -> String {
        let body: serde_json::Value = server
            .post("/api/blogs")
            .json(&serde_json::json!({
                "title": title,
                "category": "Tax",
                "content": "Self-assessment deadlines explained."
            }))
            .await
            .json();
        body["data"]["id"]
            .as_str()
            .expect("created blog has an id")
            .to_string()
    }

    /// Helper: log in as the configured admin.
    pub async fn login(&self, server: &axum_test::TestServer) -> axum_test::TestResponse {
        server
            .post("/api/auth/login")
            .json(&serde_json::json!({
                "email": ADMIN_EMAIL,
                "password": ADMIN_PASSWORD
            }))
            .await
    }
}
