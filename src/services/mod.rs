// Business logic services

pub mod chat_service;
pub mod maintenance_service;
pub mod membership_service;
pub mod profile_service;
pub mod review_service;
pub mod staff_service;
pub mod statistics_service;
pub mod support_service;
pub mod visit_service;

pub use chat_service::ChatService;
pub use maintenance_service::MaintenanceService;
pub use membership_service::MembershipService;
pub use profile_service::ProfileService;
pub use review_service::ReviewService;
pub use staff_service::StaffService;
pub use statistics_service::StatisticsService;
pub use support_service::{SupportService, TicketViewer};
pub use visit_service::VisitService;
