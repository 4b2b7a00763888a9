//! Alert messages shown to users when an action fails.
//!
//! Alerts are swapped into the `#alert-container` element of the base page
//! and can be dismissed by the user.

use axum::response::Html;
use maud::{Markup, html};

const ALERT_STYLE: &str = "flex items-start gap-3 p-4 mb-4 text-red-800 border border-red-300 \
    rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400 dark:border-red-800";

/// An error message with optional details.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Error { message: String, details: String },
    ErrorSimple { message: String },
}

impl Alert {
    fn message(&self) -> &str {
        match self {
            Alert::Error { message, .. } | Alert::ErrorSimple { message } => message,
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            Alert::Error { details, .. } => Some(details),
            Alert::ErrorSimple { .. } => None,
        }
    }

    fn into_markup(self) -> Markup {
        html! {
            div role="alert" class=(ALERT_STYLE)
            {
                div class="flex-1"
                {
                    span class="sr-only" { "Error" }
                    p class="font-medium" { (self.message()) }

                    @if let Some(details) = self.details().filter(|details| !details.is_empty())
                    {
                        p class="mt-1 text-sm" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Dismiss"
                    class="text-lg leading-none opacity-70 hover:opacity-100"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    "×"
                }
            }
        }
    }

    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }
}
