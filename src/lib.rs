//! Core library for the clan-sheets command line application.
//!
//! The library mirrors a source spreadsheet into a destination one, except
//! for the "Wars" sheet whose coloured rows are turned into a player roster.
//! Spreadsheet backends live under [`clan::sheets::io`], shared data
//! representations inside [`clan::sheets::model`], row classification in
//! [`clan::sheets::classify`] and [`clan::sheets::roster`], and the run
//! orchestration under [`clan::sheets::sync`].

pub mod clan;

pub use clan::sheets::{
    Result, SyncError, classify, config, error, io, mirror, model, roster, sync,
};
