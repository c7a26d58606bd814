//! Product search resolution
//!
//! A search either goes to the provider's own search endpoint, whose ranking
//! is kept as is, or is answered by scanning a full listing locally. The
//! resolver only decides and filters; fetching is left to the gateway so the
//! same retry and deadline handling applies to both paths.

use std::fmt;
use std::str::FromStr;

use shop_sdk::{CatalogQuery, Product, ServiceError};

use crate::error::{GatewayError, Result};

/// Fields a local scan matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    #[default]
    Title,
    /// Title, description or category
    AllText,
}

impl FromStr for SearchScope {
    type Err = ServiceError;

    fn from_str(s: &str) -> std::result::Result<Self, ServiceError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(SearchScope::Title),
            "all_text" | "all" => Ok(SearchScope::AllText),
            other => Err(ServiceError::configuration(format!("Unknown search scope: {}", other))),
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchScope::Title => write!(f, "title"),
            SearchScope::AllText => write!(f, "all_text"),
        }
    }
}

/// How one search will be answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPlan {
    /// Ask the provider's search endpoint
    Delegate(String),
    /// Fetch everything and keep products containing the lowercased needle
    Scan { needle: String },
}

impl SearchPlan {
    /// The catalog request this plan needs
    pub fn catalog_query(&self) -> CatalogQuery {
        match self {
            SearchPlan::Delegate(text) => CatalogQuery::Text(text.clone()),
            SearchPlan::Scan { .. } => CatalogQuery::All,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchResolver {
    scope: SearchScope,
}

impl SearchResolver {
    pub fn new(scope: SearchScope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    /// Decide how to answer `query_text`
    ///
    /// Blank text is rejected instead of degrading to a full listing.
    pub fn plan(&self, query_text: &str, native_search: bool) -> Result<SearchPlan> {
        let text = query_text.trim();
        if text.is_empty() {
            return Err(GatewayError::InvalidQuery("search query must not be empty".to_string()));
        }

        Ok(if native_search {
            SearchPlan::Delegate(text.to_string())
        } else {
            SearchPlan::Scan {
                needle: text.to_lowercase(),
            }
        })
    }

    /// Turn fetched products into the search result for `plan`
    ///
    /// Scans keep listing order, so results are stable for a fixed catalog.
    pub fn finish(&self, plan: &SearchPlan, products: Vec<Product>) -> Vec<Product> {
        match plan {
            SearchPlan::Delegate(_) => products,
            SearchPlan::Scan { needle } => products
                .into_iter()
                .filter(|product| self.matches(product, needle))
                .collect(),
        }
    }

    fn matches(&self, product: &Product, needle: &str) -> bool {
        let contains = |field: &str| field.to_lowercase().contains(needle);

        match self.scope {
            SearchScope::Title => contains(&product.title),
            SearchScope::AllText => {
                contains(&product.title) || contains(&product.description) || contains(&product.category)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u64, title: &str, description: &str, category: &str) -> Product {
        Product {
            id,
            title: title.to_string(),
            description: description.to_string(),
            price: 10.0,
            thumbnail: format!("https://img.example/{}.jpg", id),
            category: category.to_string(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Fjallraven Backpack", "Fits 15 laptops", "men's clothing"),
            product(2, "Mens Casual Premium Slim Fit T-Shirts", "Slim-fitting style", "men's clothing"),
            product(3, "WD 2TB Elements Portable External Hard Drive", "USB 3.0", "electronics"),
            product(4, "Solid Gold Petite Micropave", "Satisfaction guaranteed", "jewelery"),
            product(5, "SanDisk SSD PLUS 1TB Internal SSD", "Easy upgrade for laptops", "electronics"),
        ]
    }

    #[test]
    fn test_blank_query_is_rejected() {
        let resolver = SearchResolver::default();
        for query in ["", "   ", "\t\n"] {
            assert!(matches!(resolver.plan(query, false), Err(GatewayError::InvalidQuery(_))));
            assert!(matches!(resolver.plan(query, true), Err(GatewayError::InvalidQuery(_))));
        }
    }

    #[test]
    fn test_native_search_is_delegated() {
        let resolver = SearchResolver::default();
        let plan = resolver.plan("  Phone ", true).unwrap();

        assert_eq!(plan, SearchPlan::Delegate("Phone".to_string()));
        assert_eq!(plan.catalog_query(), CatalogQuery::Text("Phone".to_string()));

        // Provider ranking is kept untouched
        let products = catalog();
        assert_eq!(resolver.finish(&plan, products.clone()), products);
    }

    #[test]
    fn test_scan_matches_title_case_insensitively() {
        let resolver = SearchResolver::default();
        let plan = resolver.plan("SSD", false).unwrap();
        assert_eq!(plan.catalog_query(), CatalogQuery::All);

        let result = resolver.finish(&plan, catalog());
        let ids: Vec<u64> = result.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![5]);
    }

    #[test]
    fn test_scan_results_are_an_ordered_subset() {
        let resolver = SearchResolver::new(SearchScope::Title);
        let listing = catalog();

        for query in ["a", "slim", "drive", "zzz", "GOLD"] {
            let plan = resolver.plan(query, false).unwrap();
            let result = resolver.finish(&plan, listing.clone());

            let mut last_index = None;
            for found in &result {
                assert!(found.title.to_lowercase().contains(&query.to_lowercase()));
                let index = listing.iter().position(|p| p == found).unwrap();
                assert!(last_index.map_or(true, |last| index > last));
                last_index = Some(index);
            }

            // Stable across repeated calls
            assert_eq!(result, resolver.finish(&plan, listing.clone()));
        }
    }

    #[test]
    fn test_all_text_scope() {
        let plan = SearchPlan::Scan {
            needle: "laptops".to_string(),
        };

        let title_only = SearchResolver::new(SearchScope::Title).finish(&plan, catalog());
        assert!(title_only.is_empty());

        let all_text = SearchResolver::new(SearchScope::AllText).finish(&plan, catalog());
        let ids: Vec<u64> = all_text.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 5]);

        let by_category = SearchResolver::new(SearchScope::AllText).finish(
            &SearchPlan::Scan {
                needle: "jewel".to_string(),
            },
            catalog(),
        );
        assert_eq!(by_category.len(), 1);
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("title".parse::<SearchScope>().unwrap(), SearchScope::Title);
        assert_eq!("ALL_TEXT".parse::<SearchScope>().unwrap(), SearchScope::AllText);
        assert!("fuzzy".parse::<SearchScope>().is_err());
    }
}
