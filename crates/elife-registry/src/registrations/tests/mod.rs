mod common;
mod query;
mod routing;
