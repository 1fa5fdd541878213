// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Operations on terms: traversals, substitution, and CNF conversion.

pub mod cnf;
pub mod subst;
