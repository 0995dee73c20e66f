pub mod contact;
pub mod error;
pub mod pages;
pub mod posts;
pub mod projects;
pub mod revalidate;
pub mod search;
pub mod site;
