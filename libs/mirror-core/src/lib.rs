//! Core value types shared by every read endpoint of the mirror API.
//!
//! - [`entity_id`]: the `shard.realm.num` identity and its wire forms
//! - [`filter`]: `operator:value` query parameter grammar and per-field rules
//! - [`pagination`]: value-anchored "next page" links
//!
//! Nothing in here touches the database or HTTP; the query compiler lives in
//! `mirror-db` and the axum glue in `mirror-kit`.

pub mod cache;
pub mod entity_id;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod timestamp;

pub use cache::EntityIdCache;
pub use entity_id::{DerivedAddress, EntityId, EntityIdCodec, Identity};
pub use error::{BadParameters, EntityIdError, FilterError, InvalidParam, ParamIssue};
pub use filter::{
    tokenize, FieldRule, FilterSchema, FilterValue, Operator, ParsedFilter, SortOrder,
};
pub use pagination::{next_link, Links};
pub use timestamp::Timestamp;
