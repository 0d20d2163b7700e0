//! Rate and split lookup - the collaborator surface positions are valued
//! and split-adjusted through.

mod fx_model;
mod fx_provider;
mod fx_traits;

pub use fx_model::SplitAdjustment;
pub use fx_provider::StaticRateProvider;
pub use fx_traits::RateProviderTrait;
