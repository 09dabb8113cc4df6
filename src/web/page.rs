//! Page rendering: a view wrapped in the layout.

use axum::response::Html;
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Serialize;

use crate::template::{TemplateContext, Value};
use crate::web::error::WebError;
use crate::web::flash::{take_flash, Flash};
use crate::web::handlers::AppState;
use crate::web::middleware::SessionUser;

/// A view about to be rendered.
pub struct Page {
    view: &'static str,
    context: TemplateContext,
}

impl Page {
    /// Start a page for `view` with the given title.
    pub fn new(view: &'static str, title: impl Into<String>) -> Self {
        let mut context = TemplateContext::new();
        context.set("title", title.into());
        Self { view, context }
    }

    /// Add a variable.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.context.set(name, value);
        self
    }

    /// Add a serializable variable.
    pub fn with_serialized<T: Serialize>(mut self, name: &str, value: &T) -> Result<Self, WebError> {
        self.context.set_serialized(name, value)?;
        Ok(self)
    }

    /// Render to HTML with the given user and flash.
    pub fn render_html(
        mut self,
        state: &AppState,
        user: Option<&SessionUser>,
        flash: Option<&Flash>,
    ) -> Result<String, WebError> {
        self.context.set_serialized("current_user", &user)?;
        self.context.set_serialized("flash", &flash)?;
        Ok(state.templates.render_page(self.view, &self.context)?)
    }

    /// Render, consuming the pending flash from the jar.
    pub fn render(
        self,
        state: &AppState,
        jar: SignedCookieJar,
        user: Option<&SessionUser>,
    ) -> Result<(SignedCookieJar, Html<String>), WebError> {
        let (jar, flash) = take_flash(jar);
        let html = self.render_html(state, user, flash.as_ref())?;
        Ok((jar, Html(html)))
    }
}
