use std::path::Path;

use axum::http::StatusCode;
use minijinja::{context, path_loader, Environment, ErrorKind};

use crate::{
    config::Config,
    error::AppResult,
    models::{Recommendations, UserId},
};

const INDEX: &str = "index.html";
const RESULTS: &str = "results.html";
const ERROR: &str = "error.html";

/// HTML renderer for the form and results pages
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    /// Views using the templates compiled into the binary
    pub fn builtin() -> AppResult<Self> {
        let mut env = Environment::new();
        env.add_template(INDEX, include_str!("../templates/index.html"))?;
        env.add_template(RESULTS, include_str!("../templates/results.html"))?;
        env.add_template(ERROR, include_str!("../templates/error.html"))?;
        Ok(Self { env })
    }

    /// Views loading `index.html` and `results.html` from `dir`.
    ///
    /// Both templates are compiled up front so a broken override fails at
    /// startup rather than on the first request. `error.html` is optional
    /// and falls back to the built-in page.
    pub fn from_dir(dir: impl AsRef<Path>) -> AppResult<Self> {
        let mut env = Environment::new();
        env.set_loader(path_loader(dir.as_ref().to_path_buf()));
        env.get_template(INDEX)?;
        env.get_template(RESULTS)?;

        let has_error_page = match env.get_template(ERROR) {
            Ok(_) => true,
            Err(err) if err.kind() == ErrorKind::TemplateNotFound => false,
            Err(err) => return Err(err.into()),
        };
        if !has_error_page {
            env.add_template(ERROR, include_str!("../templates/error.html"))?;
        }
        Ok(Self { env })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        match &config.templates_dir {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "Loading templates from directory");
                Self::from_dir(dir)
            }
            None => Self::builtin(),
        }
    }

    /// The user id form
    pub fn index(&self) -> AppResult<String> {
        Ok(self.env.get_template(INDEX)?.render(context! {})?)
    }

    /// The results page for `user_id`
    pub fn results(&self, user_id: UserId, recommendations: &Recommendations) -> AppResult<String> {
        let html = self.env.get_template(RESULTS)?.render(context! {
            user_id => user_id,
            user_sorted_movies => &recommendations.user_sorted_movies,
            user_average_movies => &recommendations.user_average_movies,
            user_favorite_movies => &recommendations.user_favorite_movies,
        })?;
        Ok(html)
    }

    /// Error page for the HTML routes
    pub fn error(&self, status: StatusCode, message: &str) -> AppResult<String> {
        Ok(self.env.get_template(ERROR)?.render(context! {
            status => status.as_u16(),
            reason => status.canonical_reason().unwrap_or("Error"),
            message => message,
        })?)
    }
}
