pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod seeder;
pub mod validation;
pub mod db {
    pub mod blog_repository;
    pub mod connection;
    pub mod models;
    pub mod page_repository;
    pub mod settings_repository;
    pub mod testimonial_repository;
}
pub mod api {
    pub mod blogs;
    pub mod contact;
    pub mod envelope;
    pub mod errors;
    pub mod health;
    pub mod pages;
    pub mod site_settings;
    pub mod testimonials;
}
pub mod auth {
    pub mod admin_auth;
    pub mod middleware;
    pub mod models;
}
pub mod email {
    pub mod mailer;
    pub mod service;
    pub mod templates;
}

#[cfg(test)]
pub(crate) mod testing;
