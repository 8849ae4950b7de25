use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::EventResponse;
use crate::utils::error::AppError;

pub const DEFAULT_PAGE: i64 = 0;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// A zero-based page window, checked against the configured maximum size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    pub fn new(page: i64, size: i64, max_size: i64) -> Result<Self, AppError> {
        if page < 0 {
            return Err(AppError::ValidationError(
                "Page index must not be less than zero".to_string(),
            ));
        }
        if size < 1 {
            return Err(AppError::ValidationError(
                "Page size must not be less than one".to_string(),
            ));
        }
        if size > max_size {
            return Err(AppError::ValidationError(format!(
                "Page size must not be greater than {}",
                max_size
            )));
        }
        Ok(Self { page, size })
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[aliases(EventPage = Page<EventResponse>)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let total_pages = if total_elements <= 0 {
            0
        } else {
            (total_elements - 1) / request.size + 1
        };
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}
