//! Catalog search: a composable filter over items and the per-user
//! favorite/cart relations.
//!
//! Every filter is optional; the present ones are joined with `AND`. The same
//! predicates apply to the whole catalog and, through [`CatalogScope`], to a
//! user's favorites or cart.

use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use modish_core::{Color, ItemSize, UserId, VariantParseError};

use super::{RepositoryError, escape_like};
use crate::models::item::ItemSummaryRow;
use crate::response::PageRequest;

/// Invalid catalog query string.
#[derive(Debug, Error)]
pub enum CatalogQueryError {
    #[error(transparent)]
    Variant(#[from] VariantParseError),

    #[error("invalid number for {0}")]
    InvalidNumber(&'static str),
}

/// Text column the keyword is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchField {
    #[default]
    Title,
    Brand,
    Description,
}

impl SearchField {
    /// Parse a `searchField` value. Anything unknown searches titles.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "brand" => Self::Brand,
            "description" => Self::Description,
            _ => Self::Title,
        }
    }

    const fn column(self) -> &'static str {
        match self {
            Self::Title => "i.title",
            Self::Brand => "i.brand",
            Self::Description => "i.description",
        }
    }
}

/// Which items a search runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogScope {
    /// The whole catalog.
    All,
    /// Items the user marked as favorite.
    Favorites(UserId),
    /// Items in the user's cart.
    Cart(UserId),
}

/// Optional catalog filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub search_field: SearchField,
    /// Lowercased keyword with all whitespace removed; never empty.
    pub keyword: Option<String>,
    pub major_category: Option<String>,
    pub middle_category: Option<String>,
    pub subcategory: Option<String>,
    pub colors: Vec<Color>,
    pub sizes: Vec<ItemSize>,
    /// Upper bound on the list price; only positive bounds are kept.
    pub max_price: Option<i64>,
}

impl CatalogFilter {
    /// Parse the catalog query string.
    ///
    /// `colors` and `itemSizes` may be repeated or comma-separated.
    ///
    /// # Errors
    ///
    /// Returns `CatalogQueryError` for unknown colors/sizes or non-numeric
    /// `maxPrice`, `page` or `size`.
    pub fn from_query(raw: &str) -> Result<(Self, PageRequest), CatalogQueryError> {
        let mut filter = Self::default();
        let mut page = PageRequest::default();

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "searchField" => filter.search_field = SearchField::parse(&value),
                "searchTerm" => filter.keyword = normalize_keyword(&value),
                "majorCategory" => filter.major_category = non_blank(&value),
                "middleCategory" => filter.middle_category = non_blank(&value),
                "subcategory" => filter.subcategory = non_blank(&value),
                "colors" => {
                    for code in split_list(&value) {
                        let color: Color = code.parse()?;
                        if !filter.colors.contains(&color) {
                            filter.colors.push(color);
                        }
                    }
                }
                "itemSizes" => {
                    for code in split_list(&value) {
                        let size: ItemSize = code.parse()?;
                        if !filter.sizes.contains(&size) {
                            filter.sizes.push(size);
                        }
                    }
                }
                "maxPrice" => {
                    filter.max_price = parse_number(&value, "maxPrice")?.filter(|p| *p > 0);
                }
                "page" => page.page = parse_number(&value, "page")?,
                "size" => page.size = parse_number(&value, "size")?,
                _ => {}
            }
        }

        Ok((filter, page))
    }

    /// Append this filter's predicates, each prefixed with `AND`.
    fn push_predicates(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(keyword) = &self.keyword {
            qb.push(" AND lower(")
                .push(self.search_field.column())
                .push(") LIKE ")
                .push_bind(format!("%{}%", escape_like(keyword)));
        }

        for (column, value) in [
            ("i.major_category", &self.major_category),
            ("i.middle_category", &self.middle_category),
            ("i.subcategory", &self.subcategory),
        ] {
            if let Some(value) = value {
                qb.push(" AND ")
                    .push(column)
                    .push(" = ")
                    .push_bind(value.clone());
            }
        }

        if !self.colors.is_empty() {
            let codes: Vec<String> = self.colors.iter().map(|c| c.as_str().to_owned()).collect();
            qb.push(
                " AND EXISTS (SELECT 1 FROM shop.item_color c \
                 WHERE c.item_id = i.id AND c.color::text = ANY(",
            )
            .push_bind(codes)
            .push("))");
        }

        if !self.sizes.is_empty() {
            let codes: Vec<String> = self.sizes.iter().map(|s| s.as_str().to_owned()).collect();
            qb.push(
                " AND EXISTS (SELECT 1 FROM shop.item_size s \
                 WHERE s.item_id = i.id AND s.size::text = ANY(",
            )
            .push_bind(codes)
            .push("))");
        }

        if let Some(max_price) = self.max_price {
            qb.push(" AND i.price <= ").push_bind(max_price);
        }
    }
}

/// Remove all whitespace and lowercase; empty becomes `None`.
fn normalize_keyword(raw: &str) -> Option<String> {
    let keyword: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    (!keyword.is_empty()).then_some(keyword)
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number(raw: &str, name: &'static str) -> Result<Option<i64>, CatalogQueryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| CatalogQueryError::InvalidNumber(name))
}

/// Push `FROM ... WHERE TRUE` for a scope, joining the owning relation.
fn push_from(qb: &mut QueryBuilder<'_, Postgres>, scope: CatalogScope) {
    match scope {
        CatalogScope::All => {
            qb.push(" FROM shop.item i WHERE TRUE");
        }
        CatalogScope::Favorites(user_id) => {
            qb.push(
                " FROM shop.item i JOIN shop.favorite_item o ON o.item_id = i.id \
                 WHERE o.user_id = ",
            )
                .push_bind(user_id);
        }
        CatalogScope::Cart(user_id) => {
            qb.push(
                " FROM shop.item i JOIN shop.cart_item o ON o.item_id = i.id \
                 WHERE o.user_id = ",
            )
                .push_bind(user_id);
        }
    }
}

/// Repository for catalog searches.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Search items in `scope`, newest first, with the viewer's favorite and
    /// cart flags. Returns the page rows and the total match count.
    ///
    /// The owner relations are unique per `(user, item)`, so each item
    /// appears at most once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[tracing::instrument(skip(self, filter))]
    pub async fn search(
        &self,
        scope: CatalogScope,
        filter: &CatalogFilter,
        viewer: Option<UserId>,
        page: PageRequest,
    ) -> Result<(Vec<ItemSummaryRow>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_from(&mut count, scope);
        filter.push_predicates(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(
            "SELECT i.id, i.title, i.brand, i.price, i.discount_percent, i.main_image_url, \
             EXISTS (SELECT 1 FROM shop.favorite_item f WHERE f.item_id = i.id AND f.user_id = ",
        );
        select
            .push_bind(viewer)
            .push(
                ") AS is_favorite, EXISTS (SELECT 1 FROM shop.cart_item ct \
                 WHERE ct.item_id = i.id AND ct.user_id = ",
            )
            .push_bind(viewer)
            .push(") AS is_cart");
        push_from(&mut select, scope);
        filter.push_predicates(&mut select);
        select
            .push(" ORDER BY i.id DESC LIMIT ")
            .push_bind(page.size())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build_query_as::<ItemSummaryRow>()
            .fetch_all(self.pool)
            .await?;

        Ok((rows, total))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn where_clause(scope: CatalogScope, filter: &CatalogFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT i.id");
        push_from(&mut qb, scope);
        filter.push_predicates(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_from_query_parses_all_filters() {
        let (filter, page) = CatalogFilter::from_query(
            "searchField=brand&searchTerm=Wool%20Coat&majorCategory=WOMEN&middleCategory=%20\
             &colors=red&colors=BLUE,red&itemSizes=M&maxPrice=100&page=2&size=20",
        )
        .unwrap();

        assert_eq!(filter.search_field, SearchField::Brand);
        assert_eq!(filter.keyword.as_deref(), Some("woolcoat"));
        assert_eq!(filter.major_category.as_deref(), Some("WOMEN"));
        assert_eq!(filter.middle_category, None);
        assert_eq!(filter.colors, vec![Color::Red, Color::Blue]);
        assert_eq!(filter.sizes, vec![ItemSize::M]);
        assert_eq!(filter.max_price, Some(100));
        assert_eq!((page.page(), page.size()), (2, 20));
    }

    #[test]
    fn test_from_query_ignores_blank_and_non_positive_values() {
        let (filter, _) =
            CatalogFilter::from_query("searchTerm=%20%20&maxPrice=0&searchField=sku").unwrap();
        assert_eq!(filter, CatalogFilter::default());

        let (filter, _) = CatalogFilter::from_query("maxPrice=-5").unwrap();
        assert_eq!(filter.max_price, None);
    }

    #[test]
    fn test_from_query_rejects_unknown_variants() {
        assert!(matches!(
            CatalogFilter::from_query("colors=MAUVE"),
            Err(CatalogQueryError::Variant(_))
        ));
        assert!(matches!(
            CatalogFilter::from_query("itemSizes=XXXL"),
            Err(CatalogQueryError::Variant(_))
        ));
        assert!(matches!(
            CatalogFilter::from_query("maxPrice=cheap"),
            Err(CatalogQueryError::InvalidNumber("maxPrice"))
        ));
    }

    #[test]
    fn test_no_filters_matches_everything() {
        let sql = where_clause(CatalogScope::All, &CatalogFilter::default());
        assert_eq!(sql, "SELECT i.id FROM shop.item i WHERE TRUE");
    }

    #[test]
    fn test_predicates_are_conjunctive() {
        let filter = CatalogFilter {
            search_field: SearchField::Description,
            keyword: Some("wool".to_string()),
            subcategory: Some("PADDING".to_string()),
            colors: vec![Color::Red],
            max_price: Some(100),
            ..CatalogFilter::default()
        };
        let sql = where_clause(CatalogScope::All, &filter);

        assert!(sql.contains("AND lower(i.description) LIKE $1"));
        assert!(sql.contains("AND i.subcategory = $2"));
        assert!(sql.contains("c.color::text = ANY($3)"));
        assert!(sql.ends_with("AND i.price <= $4"));
        assert!(!sql.contains("item_size"));
    }

    #[test]
    fn test_owner_scopes_filter_on_user() {
        let filter = CatalogFilter {
            sizes: vec![ItemSize::Free],
            ..CatalogFilter::default()
        };

        let sql = where_clause(CatalogScope::Cart(UserId::new(4)), &filter);
        assert!(sql.contains("JOIN shop.cart_item o ON o.item_id = i.id WHERE o.user_id = $1"));
        assert!(sql.contains("s.size::text = ANY($2)"));

        let sql = where_clause(CatalogScope::Favorites(UserId::new(4)), &filter);
        assert!(sql.contains("JOIN shop.favorite_item o"));
    }
}
