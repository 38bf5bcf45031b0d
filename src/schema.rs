//! Table and column names of the sales extracts.

pub mod tables {
    pub const CUSTOMERS: &str = "customers";
    pub const DATE: &str = "date";
    pub const PRODUCT: &str = "product";
    pub const PRODUCT_CATEGORY: &str = "product_category";
    pub const PRODUCT_SUBCATEGORY: &str = "product_subcategory";
    pub const SALES_TERRITORY: &str = "sales_territory";
    pub const SALES: &str = "sales";
    pub const FULL_SALES: &str = "full_sales_data";

    /// Every table the fact table is joined from.
    pub const JOINED: [&str; 7] = [
        SALES,
        DATE,
        PRODUCT,
        PRODUCT_SUBCATEGORY,
        PRODUCT_CATEGORY,
        CUSTOMERS,
        SALES_TERRITORY,
    ];
}

pub mod columns {
    // surrogate keys
    pub const CUSTOMER_KEY: &str = "CustomerKey";
    pub const DATE_KEY: &str = "DateKey";
    pub const ORDER_DATE_KEY: &str = "OrderDateKey";
    pub const PRODUCT_KEY: &str = "ProductKey";
    pub const PRODUCT_SUBCATEGORY_KEY: &str = "ProductSubcategoryKey";
    pub const PRODUCT_CATEGORY_KEY: &str = "ProductCategoryKey";
    pub const SALES_TERRITORY_KEY: &str = "SalesTerritoryKey";

    // date dimension
    pub const FULL_DATE: &str = "FullDateAlternateKey";
    pub const CALENDAR_YEAR: &str = "CalendarYear";
    pub const CALENDAR_QUARTER: &str = "CalendarQuarter";
    pub const MONTH_NAME: &str = "EnglishMonthName";
    pub const MONTH_NUMBER: &str = "MonthNumberOfYear";

    // product hierarchy
    pub const PRODUCT_NAME: &str = "EnglishProductName";
    pub const SUBCATEGORY_NAME: &str = "EnglishProductSubcategoryName";
    pub const CATEGORY_NAME: &str = "EnglishProductCategoryName";

    // customers
    pub const FIRST_NAME: &str = "FirstName";
    pub const LAST_NAME: &str = "LastName";
    pub const YEARLY_INCOME: &str = "YearlyIncome";

    // territory
    pub const TERRITORY_COUNTRY: &str = "SalesTerritoryCountry";
    pub const TERRITORY_REGION: &str = "SalesTerritoryRegion";

    // sales measures
    pub const SALES_ORDER_NUMBER: &str = "SalesOrderNumber";
    pub const SALES_AMOUNT: &str = "SalesAmount";
    pub const ORDER_QUANTITY: &str = "OrderQuantity";
    pub const TOTAL_PRODUCT_COST: &str = "TotalProductCost";
}
