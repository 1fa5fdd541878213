// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! A prototype SMT solver for a boolean/integer fragment of SMT-LIB 2.
//!
//! Terms are hash-consed and eagerly simplified ([syntax]), assertions are
//! converted to CNF with the Tseitin transformation ([term::cnf]), and
//! satisfiability is decided by a CDCL SAT core ([solver]). The SMT-LIB
//! front end ([smtlib]) recovers from syntax and sort errors and keeps
//! interpreting, collecting positioned diagnostics along the way.

// configure clippy
#![allow(clippy::needless_return)]
#![allow(clippy::large_enum_variant)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::type_complexity)]
// documentation-related lints (only checked when running rustdoc)
#![warn(missing_docs)]
#![allow(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod printer;
pub mod scan;
pub mod scope;
pub mod smtlib;
pub mod solver;
pub mod syntax;
pub mod term;
