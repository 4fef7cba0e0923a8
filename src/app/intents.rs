//! Named intents: the only way filter criteria change.
//!
//! Every intent except the two pagination intents also returns the user to
//! the first page.
//!
//! Intents also have a compact textual form used by the command-line
//! front end:
//!
//! ```text
//! sort priceAsc          min 100        max -          categories a,b
//! toggle-category c1     category c1    clear-categories
//! attr color red         clear-attr color               clear-attrs
//! page 2                 page-size 50   search red lamp reset
//! ```
//!
//! `-` clears a price bound.

use crate::domain::error::FacetError;
use crate::domain::SortKey;
use std::str::FromStr;

/// A user request to change the filter criteria.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    SetSort(SortKey),
    SetPriceMin(Option<f64>),
    SetPriceMax(Option<f64>),
    /// Replaces the whole category selection with exactly these ids.
    SetCategoryIds(Vec<String>),
    /// Closure-aware toggle. The empty id clears every selected category.
    ToggleCategory(String),
    /// Discards the current selection and selects one category plus its closure.
    SelectCategory(String),
    ClearCategories,
    ToggleAttribute {
        key: String,
        value: String,
    },
    ClearAttribute(String),
    ClearAttributes,
    SetPage(u32),
    SetPageSize(u32),
    SetSearch(String),
    Reset,
}

impl Intent {
    /// Pagination intents keep the current page semantics; all others reset to page 1.
    #[must_use]
    pub const fn is_pagination(&self) -> bool {
        matches!(self, Self::SetPage(_) | Self::SetPageSize(_))
    }

    /// Short name for tracing.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetSort(_) => "set_sort",
            Self::SetPriceMin(_) => "set_price_min",
            Self::SetPriceMax(_) => "set_price_max",
            Self::SetCategoryIds(_) => "set_category_ids",
            Self::ToggleCategory(_) => "toggle_category",
            Self::SelectCategory(_) => "select_category",
            Self::ClearCategories => "clear_categories",
            Self::ToggleAttribute { .. } => "toggle_attribute",
            Self::ClearAttribute(_) => "clear_attribute",
            Self::ClearAttributes => "clear_attributes",
            Self::SetPage(_) => "set_page",
            Self::SetPageSize(_) => "set_page_size",
            Self::SetSearch(_) => "set_search",
            Self::Reset => "reset",
        }
    }
}

impl FromStr for Intent {
    type Err = FacetError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let invalid = |reason: &str| FacetError::InvalidIntent(format!("{line}: {reason}"));

        let intent = match command {
            "sort" => Self::SetSort(rest.parse().map_err(|e: String| invalid(&e))?),
            "min" => Self::SetPriceMin(parse_bound(rest).map_err(|e| invalid(&e))?),
            "max" => Self::SetPriceMax(parse_bound(rest).map_err(|e| invalid(&e))?),
            "categories" => Self::SetCategoryIds(
                rest.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            "toggle-category" => Self::ToggleCategory(rest.to_string()),
            "category" => Self::SelectCategory(rest.to_string()),
            "clear-categories" => Self::ClearCategories,
            "attr" => {
                let (key, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| invalid("expected `attr <key> <value>`"))?;
                Self::ToggleAttribute {
                    key: key.to_string(),
                    value: value.trim().to_string(),
                }
            }
            "clear-attr" => Self::ClearAttribute(rest.to_string()),
            "clear-attrs" => Self::ClearAttributes,
            "page" => Self::SetPage(rest.parse().map_err(|_| invalid("expected a page number"))?),
            "page-size" => {
                Self::SetPageSize(rest.parse().map_err(|_| invalid("expected a page size"))?)
            }
            "search" => Self::SetSearch(rest.to_string()),
            "reset" => Self::Reset,
            _ => return Err(invalid("unknown command")),
        };
        Ok(intent)
    }
}

fn parse_bound(text: &str) -> Result<Option<f64>, String> {
    if text.is_empty() || text == "-" {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("`{text}` is not a number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_textual_intents() {
        assert_eq!(
            "sort priceDesc".parse::<Intent>().ok(),
            Some(Intent::SetSort(SortKey::PriceDescending))
        );
        assert_eq!(
            "min 10.5".parse::<Intent>().ok(),
            Some(Intent::SetPriceMin(Some(10.5)))
        );
        assert_eq!("max -".parse::<Intent>().ok(), Some(Intent::SetPriceMax(None)));
        assert_eq!(
            "attr color dark blue".parse::<Intent>().ok(),
            Some(Intent::ToggleAttribute {
                key: "color".to_string(),
                value: "dark blue".to_string()
            })
        );
        assert_eq!(
            "categories b, a".parse::<Intent>().ok(),
            Some(Intent::SetCategoryIds(vec!["b".to_string(), "a".to_string()]))
        );
        assert_eq!("toggle-category".parse::<Intent>().ok(), Some(Intent::ToggleCategory(String::new())));
    }

    #[test]
    fn rejects_unknown_or_malformed_lines() {
        assert!(matches!(
            "teleport home".parse::<Intent>(),
            Err(FacetError::InvalidIntent(_))
        ));
        assert!("page two".parse::<Intent>().is_err());
        assert!("attr color".parse::<Intent>().is_err());
        assert!("sort cheapest".parse::<Intent>().is_err());
    }

    #[test]
    fn only_page_intents_are_pagination() {
        assert!(Intent::SetPage(2).is_pagination());
        assert!(Intent::SetPageSize(10).is_pagination());
        assert!(!Intent::SetSearch("x".to_string()).is_pagination());
        assert!(!Intent::Reset.is_pagination());
    }
}
