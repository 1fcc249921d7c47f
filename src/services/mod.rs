pub(crate) mod csite;
pub(crate) mod kokwatch;
pub(crate) mod mines;

pub(crate) use csite::CSiteClient;
pub(crate) use kokwatch::{KokWatchClient, KokWatchReply};
pub(crate) use mines::MineCatalog;
