pub mod apply;
pub mod dispatch;
pub mod inspect;
pub mod plan;
pub mod refresh;
pub mod run;
pub mod schema;
pub mod shared;
