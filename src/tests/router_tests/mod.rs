mod application_tests;
mod auth_tests;
mod content_tests;
mod dashboard_tests;
mod report_tests;
