mod unix;

pub(crate) use unix::*;
