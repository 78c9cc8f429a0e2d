//! Command handlers for the gm-ticket CLI

mod base;
mod survey;
mod tickets;

pub use base::HandlerContext;
pub use survey::handle_survey_command;
pub use tickets::{
    handle_close_command, handle_delete_all_command, handle_delete_command, handle_edit_command,
    handle_list_command, handle_respond_command, handle_show_command,
};
