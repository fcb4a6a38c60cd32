use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError};

use crate::error::UserError;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Stored user record.
///
/// `name` and `email` are nullable at this level; only the HTTP request layer
/// requires them. `email` is the natural key and never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Assigned by the repository on first save
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl User {
    /// A record that has not been saved yet; the repository assigns its id.
    pub fn new(name: Option<String>, email: Option<String>, roles: Vec<String>) -> Self {
        Self {
            id: Uuid::nil(),
            name,
            email,
            roles,
        }
    }
}

/// Body of create and update requests
///
/// Absent fields and explicit nulls both deserialize to empty values so they
/// fail field validation rather than JSON parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct UserRequest {
    #[serde(deserialize_with = "null_as_default")]
    #[validate(custom(function = "validate_name"))]
    #[schema(example = "jane")]
    pub name: String,

    #[serde(deserialize_with = "null_as_default")]
    #[validate(custom(function = "validate_email_address"))]
    #[schema(example = "jane@example.com")]
    pub email: String,

    #[serde(deserialize_with = "null_as_default")]
    #[validate(length(min = 1, message = "At least one role is required"))]
    #[schema(example = json!(["admin"]))]
    pub roles: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("required").with_message("Name is required".into()));
    }
    Ok(())
}

fn validate_email_address(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::new("required").with_message("Email is required".into()));
    }
    if !email.validate_email() {
        return Err(ValidationError::new("email").with_message("Email must be valid".into()));
    }
    Ok(())
}

/// Public view of a user; the internal id is not exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, ToSchema)]
#[strum(serialize_all = "lowercase")]
pub enum SortField {
    #[default]
    Id,
    Email,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, ToSchema)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// A validated paging request: zero-based page, 1..=100 items, one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
    pub sort_by: SortField,
    pub direction: SortDirection,
}

impl PageRequest {
    pub fn new(page: u64, size: u64, sort_by: SortField, direction: SortDirection) -> Self {
        Self {
            page,
            size,
            sort_by,
            direction,
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

/// Raw paging query string.
///
/// Paging is opt-in: only when all four parameters are present does the
/// listing switch to the paged envelope.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct PageParams {
    /// Zero-based page index
    pub page: Option<String>,
    /// Items per page, 1 to 100
    pub size: Option<String>,
    /// One of `id`, `email`, `name`
    pub sort_by: Option<String>,
    /// `ASC` or `DESC`
    pub sort_direction: Option<String>,
}

impl PageParams {
    /// `Ok(None)` unless every parameter is supplied; otherwise the parsed
    /// request or every parameter error at once.
    pub fn into_page_request(self) -> Result<Option<PageRequest>, UserError> {
        let (Some(page), Some(size), Some(sort_by), Some(direction)) =
            (self.page, self.size, self.sort_by, self.sort_direction)
        else {
            return Ok(None);
        };

        let mut errors: BTreeMap<String, String> = BTreeMap::new();

        let page = match page.trim().parse::<i64>() {
            Ok(p) if p >= 0 => Some(p as u64),
            Ok(_) => {
                errors.insert("page".into(), "Page number must be non-negative".into());
                None
            }
            Err(_) => {
                errors.insert("page".into(), "Page number must be an integer".into());
                None
            }
        };

        let size = match size.trim().parse::<i64>() {
            Ok(s) if s < 1 => {
                errors.insert("size".into(), "Page size must be at least 1".into());
                None
            }
            Ok(s) if s as u64 > MAX_PAGE_SIZE => {
                errors.insert("size".into(), "Page size cannot exceed 100".into());
                None
            }
            Ok(s) => Some(s as u64),
            Err(_) => {
                errors.insert("size".into(), "Page size must be an integer".into());
                None
            }
        };

        let sort_by = sort_by.parse::<SortField>().ok();
        if sort_by.is_none() {
            errors.insert(
                "sortBy".into(),
                "Sort field must be one of: id, email, name".into(),
            );
        }

        let direction = direction.parse::<SortDirection>().ok();
        if direction.is_none() {
            errors.insert(
                "sortDirection".into(),
                "Sort direction must be either ASC or DESC".into(),
            );
        }

        match (page, size, sort_by, direction) {
            (Some(page), Some(size), Some(sort_by), Some(direction)) if errors.is_empty() => {
                Ok(Some(PageRequest::new(page, size, sort_by, direction)))
            }
            _ => Err(UserError::InvalidPage(errors)),
        }
    }
}

/// One slice of a sorted listing plus the size of the whole listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.request.size.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub size: u64,
    pub number: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

/// JSON envelope for paged listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: PageMetadata,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let metadata = PageMetadata {
            size: page.request.size,
            number: page.request.page,
            total_elements: page.total,
            total_pages: page.total_pages(),
        };

        Self {
            content: page.content,
            page: metadata,
        }
    }
}
