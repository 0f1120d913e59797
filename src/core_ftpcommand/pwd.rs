use crate::core_network::control::ControlChannel;
use crate::session::Session;

// Embedded quotes are doubled, as RFC 959 asks for 257 replies.
pub fn quote_path(path: &str) -> String {
    format!("\"{}\"", path.replace('"', "\"\""))
}

pub async fn handle_pwd_command(
    control: &mut ControlChannel,
    session: &mut Session,
) -> Result<(), std::io::Error> {
    let response = format!("{} is the current directory.", quote_path(&session.current_dir));
    control.reply(257, &response).await
}
