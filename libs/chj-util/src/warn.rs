//! Printing statements to stderr for diagnostics

#[macro_export]
macro_rules! warn {
    ($formatstr:expr $(,$arg:expr)*) => { {
        use std::io::Write;
        let mut outp = std::io::BufWriter::new(std::io::stderr().lock());
        let _ = write!(&mut outp, "W: ");
        let _ = write!(&mut outp, $formatstr $(,$arg)*);
        let _ = writeln!(&mut outp, " at {:?} line {}", file!(), line!());
        let _ = outp.flush();
    } }
}

/// Statically disabled `warn!`; import as `nowarn as warn` to
/// silence a module.
#[macro_export]
macro_rules! nowarn {
    ($formatstr:expr $(,$arg:expr)*) => {
    }
}

/// Like `warn!` but only prints if `$flag` (a bool expression) is
/// true, or tracing was enabled for the thread (see
/// `trace::enabled`).
#[macro_export]
macro_rules! trace {
    ($flag:expr; $formatstr:expr $(,$arg:expr)*) => { {
        if $flag || $crate::trace::enabled()
        {
            use std::io::Write;
            let mut outp = std::io::BufWriter::new(std::io::stderr().lock());
            let _ = write!(&mut outp, "T: ");
            let _ = write!(&mut outp, $formatstr $(,$arg)*);
            let _ = writeln!(&mut outp, " at {:?} line {}", file!(), line!());
            let _ = outp.flush();
        }
    } }
}

#[macro_export]
macro_rules! notrace {
    ($flag:expr; $formatstr:expr $(,$arg:expr)*) => {
    }
}
