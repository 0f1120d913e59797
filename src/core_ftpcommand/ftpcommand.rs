use crate::constants::RESUME_FLAG;

#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    ABOR,
    SYST,
    TYPE,
    PORT,
    PASV,
    RETR,
    STOR,
    MKD,
    CWD,
    PWD,
    LIST,
    RMD,
    REST,
    SIZE,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" => Some(FtpCommand::QUIT),
            "ABOR" => Some(FtpCommand::ABOR),
            "SYST" => Some(FtpCommand::SYST),
            "TYPE" => Some(FtpCommand::TYPE),
            "PORT" => Some(FtpCommand::PORT),
            "PASV" => Some(FtpCommand::PASV),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "MKD" => Some(FtpCommand::MKD),
            "CWD" => Some(FtpCommand::CWD),
            "PWD" => Some(FtpCommand::PWD),
            "LIST" => Some(FtpCommand::LIST),
            "RMD" => Some(FtpCommand::RMD),
            "REST" => Some(FtpCommand::REST),
            "SIZE" => Some(FtpCommand::SIZE),
            _ => None,
        }
    }

    /// Whether `-resume` means anything for this verb.
    pub fn accepts_resume(&self) -> bool {
        matches!(self, FtpCommand::RETR | FtpCommand::STOR)
    }
}

/// One parsed control line: the verb, its single argument and the
/// `-resume` modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub verb: String,
    pub command: Option<FtpCommand>,
    pub arg: String,
    pub resume: bool,
}

impl CommandLine {
    /// Splits on whitespace. The first word is the verb, the first remaining
    /// word is the argument; `-resume` is lifted out as a flag on RETR/STOR.
    /// No quoting is recognised.
    pub fn parse(line: &str) -> CommandLine {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_ascii_uppercase();
        let command = FtpCommand::from_str(&verb);
        let takes_resume = command.map_or(false, |c| c.accepts_resume());

        let mut arg = None;
        let mut resume = false;
        for word in words {
            if takes_resume && word == RESUME_FLAG {
                resume = true;
            } else if arg.is_none() {
                arg = Some(word.to_string());
            }
        }

        CommandLine {
            verb,
            command,
            arg: arg.unwrap_or_default(),
            resume,
        }
    }
}
