#![deny(warnings)]
//! Rule engine for Tractor (Shengji): trump-relative card ordering, play
//! decomposition, follow legality and trick winners.

pub mod game;
pub mod model;
pub mod rules;
