pub(crate) mod comment;
pub(crate) mod report;
pub(crate) mod requests;
pub(crate) mod responses;

pub(crate) use comment::*;
pub(crate) use report::*;
pub(crate) use requests::*;
pub(crate) use responses::*;
