mod commands;
mod handlers;
mod shell;

pub use commands::{Cli, Commands};
pub use handlers::{
    handle_add, handle_delete, handle_edit, handle_init, handle_list, handle_login, handle_logout,
    handle_register, handle_search,
};
pub use shell::{handle_shell, Flow, Shell};
