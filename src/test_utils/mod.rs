#![allow(missing_docs)]

pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;
pub(crate) mod mock_api;

pub(crate) use form::{
    assert_form_input, assert_form_submit_button_with_text, assert_hx_endpoint, must_get_form,
};
pub(crate) use html::{assert_valid_html, parse_html_document, parse_html_fragment};
pub(crate) use http::{assert_content_type, assert_hx_redirect};
pub(crate) use mock_api::{MockApi, TEST_TOKEN};

use crate::AppState;

/// Create the app state for tests, backed by `api` served on a random port.
pub(crate) async fn test_app_state(api: &MockApi) -> AppState {
    AppState::new("test secret", "Etc/UTC", api.start().await)
}
