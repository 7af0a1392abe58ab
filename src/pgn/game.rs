//! `Game`, `MoveNode`, and `Variation`. Moves live in a per-list arena
//! addressed by index rather than as heap-allocated, back-pointered
//! objects — arena-allocated moves with integer indices for
//! `prev`/`next`, which sidesteps the cyclic-ownership problem a direct
//! `Rc<RefCell<...>>` doubly-linked list would otherwise have.

use indexmap::IndexMap;

use crate::model::RawMove;

/// The seven PGN tags every parsed game must expose, in canonical
/// emission order.
pub const SEVEN_TAG_ROSTER: [&str; 7] = ["Event", "Site", "Date", "Round", "White", "Black", "Result"];

/// One ply plus its annotations. Lives in a `Vec<MoveNode>` arena;
/// `prev`/`next` are indices into that same vector.
#[derive(Debug, Clone)]
pub struct MoveNode {
    pub mv: RawMove,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    pub nags: Vec<u8>,
    pub comments: Vec<String>,
    pub variations: Vec<Variation>,
}

impl MoveNode {
    fn new(mv: RawMove) -> Self {
        Self { mv, prev: None, next: None, nags: Vec::new(), comments: Vec::new(), variations: Vec::new() }
    }
}

/// A parenthesised sub-line. Variations nest to any depth because each
/// one owns its own move arena, and each `MoveNode` in that arena can
/// itself carry further variations.
#[derive(Debug, Clone, Default)]
pub struct Variation {
    pub prefix_comments: Vec<String>,
    pub moves: Vec<MoveNode>,
    pub head: Option<usize>,
    /// A terminating result found inside the variation attaches here,
    /// not to the enclosing game.
    pub result: Option<String>,
    pub suffix_comments: Vec<String>,
}

impl Variation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a move to this variation's main line, linking it to the
    /// previous tail.
    pub fn push_move(&mut self, mv: RawMove) -> usize {
        let ix = self.moves.len();
        let mut node = MoveNode::new(mv);
        if let Some(tail) = self.last_index() {
            node.prev = Some(tail);
            self.moves[tail].next = Some(ix);
        } else {
            self.head = Some(ix);
        }
        self.moves.push(node);
        ix
    }

    pub fn last_index(&self) -> Option<usize> {
        let mut ix = self.head?;
        while let Some(next) = self.moves[ix].next {
            ix = next;
        }
        Some(ix)
    }
}

/// A fully parsed game.
#[derive(Debug, Clone)]
pub struct Game {
    pub tags: IndexMap<String, String>,
    pub prefix_comments: Vec<String>,
    pub moves: Vec<MoveNode>,
    pub head: Option<usize>,
    pub result: String,
    pub start_line: u32,
    pub end_line: u32,
    /// Set when the parser had to resync after a grammar error inside
    /// this game.
    pub broken: bool,
}

impl Game {
    pub fn new(start_line: u32) -> Self {
        let mut tags = IndexMap::new();
        for key in SEVEN_TAG_ROSTER {
            tags.insert(key.to_string(), "?".to_string());
        }
        Self {
            tags,
            prefix_comments: Vec::new(),
            moves: Vec::new(),
            head: None,
            result: "*".to_string(),
            start_line,
            end_line: start_line,
            broken: false,
        }
    }

    /// Guarantees the seven-tag roster is present, filling any gap with
    /// `"?"`. Call after all `[Tag "value"]` lines
    /// have been absorbed, since a real tag always overrides the
    /// placeholder inserted by `Game::new`.
    pub fn ensure_seven_tag_roster(&mut self) {
        for key in SEVEN_TAG_ROSTER {
            self.tags.entry(key.to_string()).or_insert_with(|| "?".to_string());
        }
    }

    pub fn set_tag(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(name.into(), value.into());
    }

    pub fn push_move(&mut self, mv: RawMove) -> usize {
        let ix = self.moves.len();
        let mut node = MoveNode::new(mv);
        if let Some(tail) = self.last_index() {
            node.prev = Some(tail);
            self.moves[tail].next = Some(ix);
        } else {
            self.head = Some(ix);
        }
        self.moves.push(node);
        ix
    }

    pub fn last_index(&self) -> Option<usize> {
        let mut ix = self.head?;
        while let Some(next) = self.moves[ix].next {
            ix = next;
        }
        Some(ix)
    }

    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    /// Every `m.next.prev == m`.
    pub fn move_list_is_consistent(&self) -> bool {
        self.moves.iter().enumerate().all(|(ix, node)| match node.next {
            Some(next) => self.moves[next].prev == Some(ix),
            None => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MoveClass;

    fn dummy_move(text: &str) -> RawMove {
        RawMove::unknown(text)
    }

    #[test]
    fn seven_tag_roster_always_present() {
        let mut game = Game::new(1);
        game.set_tag("White", "Tal");
        game.ensure_seven_tag_roster();
        for key in SEVEN_TAG_ROSTER {
            assert!(game.tags.contains_key(key));
        }
        assert_eq!(game.tags.get("White").unwrap(), "Tal");
        assert_eq!(game.tags.get("Event").unwrap(), "?");
    }

    #[test]
    fn move_list_links_are_consistent() {
        let mut game = Game::new(1);
        game.push_move(dummy_move("e4"));
        game.push_move(dummy_move("e5"));
        game.push_move(dummy_move("Nf3"));
        assert!(game.move_list_is_consistent());
        assert_eq!(game.ply_count(), 3);
        assert_eq!(game.moves[0].mv.class, MoveClass::UnknownMove);
    }
}
