//! Interactive 2D scene graph and render engine.
//!
//! This crate owns a retained scene of transformable shapes and groups, draws
//! it through a small 2D-context abstraction with per-object render caches,
//! and turns pointer and keyboard input into selection and transform
//! gestures. The same code runs in the browser (compiled to WebAssembly,
//! drawing through [`web`]) and natively against the recording backend in
//! [`display_list`], which is what the tests and the host binary use.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`point`], [`matrix`], [`intersection`] | Geometry primitives |
//! | [`doc`] | Entity record, typed properties, object store |
//! | [`transform`], [`coords`] | Matrices, origin math, corner coordinates |
//! | [`cache`] | Per-object render cache sizing and dirtiness |
//! | [`group`] | Groups and the transient active selection |
//! | [`camera`] | Viewport transform |
//! | [`scene`] | The scene: collection, z-order, selection, rendering |
//! | [`render`], [`controls`] | Drawing entities, borders and handles |
//! | [`display_list`], [`web`] | Recording and browser backends |
//! | [`hit`], [`input`], [`actions`] | Target finding, gesture state, transforms |
//! | [`engine`] | Pointer/keyboard state machine ([`engine::EngineCore`]) |
//! | [`events`] | Typed event bus |
//! | [`serialize`], [`svg`] | JSON payloads and SVG export |
//! | [`config`], [`error`], [`consts`] | Options, errors, shared constants |

pub mod actions;
pub mod cache;
pub mod camera;
pub mod config;
pub mod consts;
pub mod controls;
pub mod coords;
pub mod display_list;
pub mod doc;
pub mod engine;
pub mod error;
pub mod events;
pub mod group;
pub mod hit;
pub mod input;
pub mod intersection;
pub mod matrix;
pub mod point;
pub mod render;
pub mod scene;
pub mod serialize;
pub mod svg;
pub mod transform;
pub mod web;
