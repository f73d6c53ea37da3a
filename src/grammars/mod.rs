//! Ready-made grammars, installed with [`Engine::use_plugin`](crate::Engine::use_plugin).

pub mod braces;
