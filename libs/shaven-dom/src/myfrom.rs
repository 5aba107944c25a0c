use std::borrow::Cow;

use kstring::KString;

// A separate trait instead of `From` so that the string-ish
// conversions below can live next to the foreign `KString` type, and
// so that numbers can be turned into text nodes directly.
pub trait MyFrom<T> {
    fn myfrom(s: T) -> Self;
}

// Can't do KString::from_static: no way to have a separate trait impl
// for &'static.
impl MyFrom<&str> for KString {
    fn myfrom(s: &str) -> Self {
        KString::from_ref(s)
    }
}

impl MyFrom<&&str> for KString {
    fn myfrom(s: &&str) -> Self {
        KString::from_ref(*s)
    }
}

impl MyFrom<&String> for KString {
    fn myfrom(s: &String) -> Self {
        KString::from_ref(s)
    }
}

impl MyFrom<String> for KString {
    fn myfrom(s: String) -> Self {
        KString::from_string(s)
    }
}

impl MyFrom<&KString> for KString {
    fn myfrom(s: &KString) -> Self {
        s.clone()
    }
}

impl MyFrom<KString> for KString {
    fn myfrom(s: KString) -> Self {
        s
    }
}

impl<'t> MyFrom<Cow<'t, str>> for KString {
    fn myfrom(s: Cow<'t, str>) -> Self {
        match s {
            Cow::Borrowed(s) => KString::from_ref(s),
            Cow::Owned(s) => KString::from_string(s),
        }
    }
}

macro_rules! myfrom_display {
    ($($t:ty)*) => {
        $(
            impl MyFrom<$t> for KString {
                fn myfrom(val: $t) -> Self {
                    KString::from_string(val.to_string())
                }
            }
        )*
    }
}

myfrom_display!(usize u32 u64 i32 i64 f64 char);


pub fn kstring<T>(s: T) -> KString
where KString: MyFrom<T>
{
    KString::myfrom(s)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_myfrom() {
        assert_eq!(kstring("a").as_str(), "a");
        assert_eq!(kstring(String::from("b")).as_str(), "b");
        assert_eq!(kstring(Cow::Borrowed("c")).as_str(), "c");
        assert_eq!(kstring(42usize).as_str(), "42");
        assert_eq!(kstring(-3i64).as_str(), "-3");
    }
}
