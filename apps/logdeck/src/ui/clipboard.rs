//! System clipboard access. Tests swap in a per-thread fake so they never
//! touch the real clipboard.


#[cfg(not(test))]
mod imp {
    use copypasta::{ClipboardContext, ClipboardProvider};

    pub fn set(contents: &str) -> Result<(), String> {
        let mut ctx = ClipboardContext::new().map_err(|err| err.to_string())?;
        ctx.set_contents(contents.to_string())
            .map_err(|err| err.to_string())
    }
}

pub use imp::set;

#[cfg(test)]
pub use imp::{fail_next, get};
