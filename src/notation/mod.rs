//! Move notation: decoding one token into an abstract [`RawMove`] (C3)
//! and rendering a resolved move back out in a chosen notation (C5).

use chumsky::error::Rich;
use chumsky::extra::Err;
use chumsky::Parser;

pub mod decode;
pub mod render;

/// Stands in for an earlier `trait Prs<'s, O> = Parser<...>;` alias,
/// which needs the unstable `trait_alias` feature that was never
/// actually declared. A marker trait with a blanket impl gets the
/// same ergonomics on stable: anything that implements the right
/// `chumsky::Parser` bound implements `Prs` for free.
pub trait Prs<'s, O>: Parser<'s, &'s str, O, Err<Rich<'s, char>>> {}

impl<'s, O, T> Prs<'s, O> for T where T: Parser<'s, &'s str, O, Err<Rich<'s, char>>> {}
