//! allow-scripts - run only the npm lifecycle scripts you trust
//!
//! npm runs the `preinstall`, `install` and `postinstall` scripts of every
//! package it installs. allow-scripts flips that around: install with
//! `npm install --ignore-scripts`, list the dependencies you trust in
//! `package.json`, and let allow-scripts run exactly those scripts, in
//! dependency order.
//!
//! ```json
//! {
//!   "name": "my-app",
//!   "scripts": { "postinstall": "allow-scripts" },
//!   "allowScripts": {
//!     "fsevents": true,
//!     "core-js": false,
//!     "node-sass": "^4.0.0"
//!   }
//! }
//! ```
//!
//! A dependency with install scripts but no `allowScripts` entry stops the run
//! before anything executes. Listing it as `false` skips it with a notice, and
//! a version range approves only the installed versions inside it.
//!
//! # Architecture Overview
//!
//! One run is a pipeline of mostly pure stages:
//!
//! 1. [`tree`] builds the logical dependency tree from the lock file and the
//!    installed `package.json` files, flagging packages inside cycles
//! 2. [`resolver`] collects ordering constraints, pruning cyclic packages, and
//!    sorts them topologically
//! 3. [`policy`] judges every package with install scripts against the
//!    allow-list
//! 4. [`installer`] runs the approved scripts in five serialized phases
//!
//! # Core Modules
//!
//! - [`cli`] - command-line interface
//! - [`constants`] - file names, environment variables, console prefixes
//! - [`core`] - error types and skip notices
//! - [`installer`] - orchestration, phased executor and the shell script runner
//! - [`lockfile`] - `package-lock.json` / `npm-shrinkwrap.json` model and discovery
//! - [`manifest`] - `package.json` model including `allowScripts`
//! - [`policy`] - allow-list evaluation
//! - [`resolver`] - constraint collection and scheduling
//! - [`tree`] - logical dependency tree
//! - [`utils`] - console output and platform helpers
//! - [`version`] - npm version ranges

pub mod cli;
pub mod constants;
pub mod core;

pub mod lockfile;
pub mod manifest;
pub mod tree;

pub mod policy;
pub mod resolver;

pub mod installer;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
