/// Describes what a provider can do, which informs operation dispatch.
#[derive(Debug)]
pub struct Capability {
    pub insert: bool,
    pub update: bool,
    pub delete: bool,
    pub bulk_update: bool,

    /// Default number of rows streamed per bulk-load batch. `None` means the
    /// provider loads the whole set in a single batch unless the caller says
    /// otherwise.
    pub default_insert_batch_size: Option<usize>,
}

impl Capability {
    /// SQL Server capabilities.
    pub const SQL_SERVER: Self = Self {
        insert: true,
        update: true,
        delete: true,
        bulk_update: true,
        default_insert_batch_size: Some(15_000),
    };

    /// MySQL capabilities. The staged-file loader defaults to one file per
    /// call rather than a fixed batch size.
    pub const MYSQL: Self = Self {
        default_insert_batch_size: None,
        ..Self::SQL_SERVER
    };
}
