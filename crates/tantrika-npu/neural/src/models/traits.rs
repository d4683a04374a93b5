// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Traits shared by element models

use crate::types::PortSpec;

/// Port table of an element type.
///
/// The engine binds signals to ports by name and addresses them by ordinal (the index in
/// [`PortLayout::PORTS`]) during simulation.
pub trait PortLayout {
    /// Type tag used in logs and error messages
    const TYPE_NAME: &'static str;

    /// Ports in ordinal order
    const PORTS: &'static [PortSpec];
}

/// Elements addressable by a unique path
pub trait Named {
    fn path(&self) -> &str;
}
