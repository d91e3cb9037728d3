pub(crate) mod eval;
pub(crate) mod parse;
pub(crate) mod sqlish;
pub(crate) mod tokens;
