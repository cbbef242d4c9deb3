pub mod db_check;
pub mod hello;
pub mod proxy;
pub mod visits;
