//! # Drivers
//!
//! | Driver  | Diretório  | Hardware                         |
//! |---------|------------|----------------------------------|
//! | Display | `display/` | VOP Rockchip (RK3288)            |

pub mod display;
