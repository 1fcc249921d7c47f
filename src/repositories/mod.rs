pub(crate) mod comments;
pub(crate) mod reports;
pub(crate) mod response_actions;

pub(crate) use comments::{CommentRepository, NewComment};
pub(crate) use reports::{NewReport, ReportFilter, ReportRepository};
pub(crate) use response_actions::ResponseActionRepository;
