pub mod trending_refresh;
