//! 模型目录模块
//!
//! 发现各上游提供方的模型列表，构建并缓存 model → provider 路由表。

mod builder;
mod normalize;
mod state;
mod table;

pub use builder::CatalogBuilder;
pub use state::{Catalog, CatalogPhase};
pub use table::{ModelEntry, RoutingTable};
