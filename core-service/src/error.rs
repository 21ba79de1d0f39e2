use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Runtime(#[from] core_runtime::RuntimeError),

    #[error("search adapter construction failed: {0}")]
    Search(#[from] provider_youtube::SearchError),

    #[error("gateway construction failed: {0}")]
    Gateway(#[from] gateway_traits::GatewayError),

    #[error("catalog error: {0}")]
    Catalog(#[from] core_catalog::CatalogError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
