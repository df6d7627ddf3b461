//! Product listing state: search text, sort, filters and pagination.

use freshmart_core::{BrandId, CategoryId, ProductSort};
use rust_decimal::Decimal;
use tracing::{instrument, warn};

use crate::api::{Api, Product, ProductPage, ProductQuery};
use crate::storage::KeyValueStore;

/// Most page links shown at once.
pub const PAGE_WINDOW: u32 = 5;

/// One entry of the page-number bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(u32),
    Gap,
}

/// Number of pages for `results` at `page_size`, at least 1.
#[must_use]
pub fn total_pages(results: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    let pages = results.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// The page-number bar: up to [`PAGE_WINDOW`] pages around `current`, plus
/// the first and last page with gaps where pages are skipped.
#[must_use]
pub fn page_links(current: u32, total: u32) -> Vec<PageLink> {
    let total = total.max(1);
    let current = current.clamp(1, total);

    let half = PAGE_WINDOW / 2;
    let mut start = current.saturating_sub(half).max(1);
    let end = (start + PAGE_WINDOW - 1).min(total);
    if end - start + 1 < PAGE_WINDOW {
        start = end.saturating_sub(PAGE_WINDOW - 1).max(1);
    }

    let mut links = Vec::new();
    if start > 1 {
        links.push(PageLink::Page(1));
        if start > 2 {
            links.push(PageLink::Gap);
        }
    }
    links.extend((start..=end).map(PageLink::Page));
    if end < total {
        if end < total - 1 {
            links.push(PageLink::Gap);
        }
        links.push(PageLink::Page(total));
    }
    links
}

/// Listing controls plus the last fetched page.
#[derive(Debug, Clone)]
pub struct ListingState {
    search: String,
    sort: ProductSort,
    page: u32,
    page_size: u32,
    category: Option<CategoryId>,
    brand: Option<BrandId>,
    price_gte: Option<Decimal>,
    price_lte: Option<Decimal>,
    products: Vec<Product>,
    results: u64,
    error: Option<String>,
}

impl ListingState {
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            search: String::new(),
            sort: ProductSort::default(),
            page: 1,
            page_size: page_size.max(1),
            category: None,
            brand: None,
            price_gte: None,
            price_lte: None,
            products: Vec::new(),
            results: 0,
            error: None,
        }
    }

    // =========================================================================
    // Controls
    // =========================================================================

    /// Change the search text. Resets to page 1 when it changes.
    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if search != self.search {
            self.search = search;
            self.page = 1;
        }
    }

    /// Change the sort key. Resets to page 1 when it changes.
    pub fn set_sort(&mut self, sort: ProductSort) {
        if sort != self.sort {
            self.sort = sort;
            self.page = 1;
        }
    }

    /// Jump to `page`. Pages past the end are allowed and list nothing.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Restrict to a category. Resets to page 1.
    pub fn set_category(&mut self, category: Option<CategoryId>) {
        if category != self.category {
            self.category = category;
            self.page = 1;
        }
    }

    /// Restrict to a brand. Resets to page 1.
    pub fn set_brand(&mut self, brand: Option<BrandId>) {
        if brand != self.brand {
            self.brand = brand;
            self.page = 1;
        }
    }

    /// Restrict to a price range. Resets to page 1.
    pub fn set_price_range(&mut self, min: Option<Decimal>, max: Option<Decimal>) {
        if (min, max) != (self.price_gte, self.price_lte) {
            self.price_gte = min;
            self.price_lte = max;
            self.page = 1;
        }
    }

    /// The query the next fetch sends.
    #[must_use]
    pub fn query(&self) -> ProductQuery {
        ProductQuery {
            limit: self.page_size,
            page: self.page,
            sort: self.sort,
            keyword: Some(self.search.trim().to_string()).filter(|s| !s.is_empty()),
            category: self.category.clone(),
            brand: self.brand.clone(),
            price_gte: self.price_gte,
            price_lte: self.price_lte,
        }
    }

    // =========================================================================
    // Results
    // =========================================================================

    /// Record a fetched page.
    pub fn apply_page(&mut self, page: ProductPage) {
        self.products = page.products;
        self.results = page.results;
        self.error = None;
    }

    /// Record a failed fetch: no products, one page, and the message.
    pub fn apply_error(&mut self, message: impl Into<String>) {
        self.products.clear();
        self.results = 0;
        self.error = Some(message.into());
    }

    /// Fetch the current query and record the outcome.
    #[instrument(skip_all, fields(page = self.page, sort = %self.sort))]
    pub async fn fetch<S: KeyValueStore>(&mut self, api: &Api<S>) {
        match api.list_products(&self.query()).await {
            Ok(page) => self.apply_page(page),
            Err(e) => {
                warn!(error = %e, "Failed to fetch products");
                self.apply_error("Failed to load products. Please try again.");
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub const fn sort(&self) -> ProductSort {
        self.sort
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn category(&self) -> Option<&CategoryId> {
        self.category.as_ref()
    }

    #[must_use]
    pub const fn brand(&self) -> Option<&BrandId> {
        self.brand.as_ref()
    }

    #[must_use]
    pub const fn price_range(&self) -> (Option<Decimal>, Option<Decimal>) {
        (self.price_gte, self.price_lte)
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn results(&self) -> u64 {
        self.results
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn total_pages(&self) -> u32 {
        total_pages(self.results, self.page_size)
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Disabled on the last page and beyond.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    #[must_use]
    pub fn page_links(&self) -> Vec<PageLink> {
        page_links(self.page, self.total_pages())
    }

    /// 1-based positions of the first and last listed product, `(0, 0)` when
    /// nothing is listed.
    #[must_use]
    pub fn showing_range(&self) -> (u64, u64) {
        if self.products.is_empty() {
            return (0, 0);
        }
        let first = u64::from(self.page - 1) * u64::from(self.page_size) + 1;
        let listed = u64::try_from(self.products.len()).unwrap_or(u64::MAX);
        let last = (first + listed - 1).min(self.results.max(first));
        (first, last)
    }
}
