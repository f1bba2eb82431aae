//! CLI command implementations.
//!
//! | Module     | Commands handled                                        |
//! |------------|---------------------------------------------------------|
//! | `case`     | `New`, `List`, `Show`, `Rename`, `Duplicate`, `Delete`, |
//! |            | `SetMain`, `Attach`, `Detach`, `Reorder`                |
//! | `assemble` | `Assemble`                                              |

pub mod assemble;
pub mod case;

pub use assemble::{AssembleArgs, cmd_assemble};
pub use case::{
    cmd_attach, cmd_delete, cmd_detach, cmd_duplicate, cmd_list, cmd_new, cmd_rename, cmd_reorder,
    cmd_set_main, cmd_show,
};
