//! Recursive-descent grammar over the lexer's token stream:
//!
//! ```text
//! Game              := SkipPrefix Tags OptNag MoveList OptComments Result
//! Tags              := (Tag String)*
//! MoveList          := MoveWithVariants*
//! MoveWithVariants  := OptMoveNumber MoveUnit OptNagList OptVariation*
//! MoveUnit          := MoveToken OptCheck OptComments
//! OptVariation      := '(' OptComments MoveList Result? ')' OptComments
//! Result            := '1-0' | '0-1' | '1/2-1/2' | '*' | ε
//! ```
//!
//! `OptCheck` is already folded into the move token by the decoder
//! (`RawMove::check`/`mate`), so `MoveUnit` only has to consume the
//! token itself plus any trailing comments.
//!
//! A null move (`--`) retained despite `allow_null_moves == false` only
//! warns when it's on the main line; the same check inside a variation
//! is silent, per the null-move notation's usual use to mark a skipped
//! reply within analysis.

use std::io::BufRead;

use crate::config::ParserConfig;
use crate::error::{Diagnostic, Diagnostics};
use crate::model::{MoveClass, RawMove};
use crate::pgn::game::{Game, MoveNode, Variation};
use crate::pgn::lexer::Lexer;
use crate::pgn::token::{Token, TokenKind};

/// Anything a move list can be pushed into: the top-level game or a
/// nested variation. Both own a `Vec<MoveNode>` arena with the same
/// append/link behaviour; this just lets `parse_move_list` stay generic
/// over which one it's filling.
trait MoveSink {
    fn push(&mut self, mv: RawMove) -> usize;
    fn node_mut(&mut self, ix: usize) -> &mut MoveNode;
    fn last_index(&self) -> Option<usize>;
}

impl MoveSink for Game {
    fn push(&mut self, mv: RawMove) -> usize {
        self.push_move(mv)
    }
    fn node_mut(&mut self, ix: usize) -> &mut MoveNode {
        &mut self.moves[ix]
    }
    fn last_index(&self) -> Option<usize> {
        Game::last_index(self)
    }
}

impl MoveSink for Variation {
    fn push(&mut self, mv: RawMove) -> usize {
        self.push_move(mv)
    }
    fn node_mut(&mut self, ix: usize) -> &mut MoveNode {
        &mut self.moves[ix]
    }
    fn last_index(&self) -> Option<usize> {
        Variation::last_index(self)
    }
}

pub struct Parser<R, D> {
    lexer: Lexer<R, D>,
    config: ParserConfig,
    lookahead: Option<Token>,
}

/// Parse every game in `reader`, returning the games plus the
/// diagnostics sink handed back so the caller can inspect it.
pub fn parse_games<R: BufRead, D: Diagnostics>(reader: R, config: ParserConfig, diagnostics: D) -> (Vec<Game>, D) {
    let lexer = Lexer::new(reader, config, diagnostics);
    Parser::new(lexer, config).parse_all_games()
}

impl<R: BufRead, D: Diagnostics> Parser<R, D> {
    pub fn new(lexer: Lexer<R, D>, config: ParserConfig) -> Self {
        Self { lexer, config, lookahead: None }
    }

    pub fn parse_all_games(mut self) -> (Vec<Game>, D) {
        let mut games = Vec::new();
        let mut number = 0u32;
        loop {
            self.skip_prefix();
            if self.at_eof() {
                break;
            }
            number += 1;
            games.push(self.parse_game(number));
        }
        (games, self.lexer.into_diagnostics())
    }

    fn peek(&mut self) -> &Token {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.lexer.next_token());
        }
        self.lookahead.as_ref().unwrap()
    }

    fn advance(&mut self) -> Token {
        self.peek();
        self.lookahead.take().unwrap()
    }

    fn at_eof(&mut self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    /// `SkipPrefix`: discard any stray tokens (orphan comments, NAGs,
    /// results, RAV punctuation) between games until the next one
    /// actually starts.
    fn skip_prefix(&mut self) {
        loop {
            match &self.peek().kind {
                TokenKind::Tag(_) | TokenKind::MoveNumber(_) | TokenKind::Move(_) | TokenKind::Eof => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_game(&mut self, number: u32) -> Game {
        let start_line = self.peek().line;
        let mut game = Game::new(start_line);
        self.parse_tags(&mut game);
        game.ensure_seven_tag_roster();

        // OptNag, plus any comments sitting ahead of the first move.
        loop {
            match &self.peek().kind {
                TokenKind::Comment(_) => {
                    let TokenKind::Comment(c) = self.advance().kind else { unreachable!() };
                    game.prefix_comments.push(c);
                }
                TokenKind::Nag(_) => {
                    self.advance();
                }
                _ => break,
            }
        }

        let mut broken = false;
        self.parse_move_list(&mut game, &mut broken, false);

        let mut trailing_comments = Vec::new();
        loop {
            match &self.peek().kind {
                TokenKind::Comment(_) => {
                    let TokenKind::Comment(c) = self.advance().kind else { unreachable!() };
                    trailing_comments.push(c);
                }
                _ => break,
            }
        }
        if let Some(ix) = MoveSink::last_index(&game) {
            game.moves[ix].comments.extend(trailing_comments);
        } else {
            game.prefix_comments.extend(trailing_comments);
        }

        let terminating = if let TokenKind::TerminatingResult(_) = &self.peek().kind {
            let TokenKind::TerminatingResult(r) = self.advance().kind else { unreachable!() };
            Some(r)
        } else {
            None
        };
        // Result precedence: terminating token, then the Result tag (if
        // it's not still the "?" placeholder), then "*".
        game.result = terminating.unwrap_or_else(|| {
            game.tags.get("Result").filter(|v| v.as_str() != "?").cloned().unwrap_or_else(|| "*".to_string())
        });

        game.end_line = self.lexer.line();
        game.broken = broken;
        if broken {
            self.lexer.report(Diagnostic::GameBroken { game_number: number, reason: "unterminated variation".to_string() });
        }
        game
    }

    fn parse_tags(&mut self, game: &mut Game) {
        while let TokenKind::Tag(_) = &self.peek().kind {
            let TokenKind::Tag(name) = self.advance().kind else { unreachable!() };
            let value = if let TokenKind::String(_) = &self.peek().kind {
                let TokenKind::String(v) = self.advance().kind else { unreachable!() };
                v
            } else {
                String::new()
            };
            game.set_tag(name, value);
        }
    }

    fn parse_move_list<S: MoveSink>(&mut self, sink: &mut S, broken: &mut bool, in_variation: bool) {
        loop {
            match &self.peek().kind {
                TokenKind::Move(_) => self.parse_move_with_variants(sink, broken, in_variation),
                TokenKind::MoveNumber(_) => {
                    // A move number with nothing after it (trailing junk,
                    // or end of a truncated game) — consume and stop.
                    self.advance();
                    if !matches!(self.peek().kind, TokenKind::Move(_)) {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn parse_move_with_variants<S: MoveSink>(&mut self, sink: &mut S, broken: &mut bool, in_variation: bool) {
        if matches!(self.peek().kind, TokenKind::MoveNumber(_)) {
            self.advance();
        }
        let Token { kind, line } = self.advance();
        let TokenKind::Move(mv) = kind else {
            return;
        };
        if mv.class == MoveClass::NullMove && !self.config.allow_null_moves && !*broken && !in_variation {
            self.lexer.report(Diagnostic::NullMoveDisallowed { line });
        }
        let ix = sink.push(mv);

        loop {
            match &self.peek().kind {
                TokenKind::Comment(_) => {
                    let TokenKind::Comment(c) = self.advance().kind else { unreachable!() };
                    sink.node_mut(ix).comments.push(c);
                }
                _ => break,
            }
        }
        loop {
            match &self.peek().kind {
                TokenKind::Nag(_) => {
                    let TokenKind::Nag(n) = self.advance().kind else { unreachable!() };
                    sink.node_mut(ix).nags.push(n);
                }
                _ => break,
            }
        }
        while matches!(self.peek().kind, TokenKind::RavStart) {
            let variation = self.parse_variation(broken);
            sink.node_mut(ix).variations.push(variation);
        }
    }

    fn parse_variation(&mut self, broken: &mut bool) -> Variation {
        let start_line = self.peek().line;
        self.advance(); // '('
        let mut variation = Variation::new();

        loop {
            match &self.peek().kind {
                TokenKind::Comment(_) => {
                    let TokenKind::Comment(c) = self.advance().kind else { unreachable!() };
                    variation.prefix_comments.push(c);
                }
                _ => break,
            }
        }

        self.parse_move_list(&mut variation, broken, true);

        if let TokenKind::TerminatingResult(_) = &self.peek().kind {
            let TokenKind::TerminatingResult(r) = self.advance().kind else { unreachable!() };
            variation.result = Some(r);
        }

        match &self.peek().kind {
            TokenKind::RavEnd => {
                self.advance();
            }
            TokenKind::Eof => {
                self.lexer.report(Diagnostic::UnmatchedVariation { line: start_line });
                *broken = true;
            }
            _ => {
                self.lexer.report(Diagnostic::UnmatchedVariation { line: start_line });
            }
        }

        loop {
            match &self.peek().kind {
                TokenKind::Comment(_) => {
                    let TokenKind::Comment(c) = self.advance().kind else { unreachable!() };
                    variation.suffix_comments.push(c);
                }
                _ => break,
            }
        }

        variation
    }
}
