/// Zero, one or many values to be put where a single one was.
#[derive(Debug, Clone, PartialEq)]
pub enum Flat<T> {
    None,
    One(T),
    Many(Vec<T>),
}

impl<T> IntoIterator for Flat<T> {
    type Item = T;
    type IntoIter = std::iter::Chain<std::option::IntoIter<T>, std::vec::IntoIter<T>>;

    fn into_iter(self) -> Self::IntoIter {
        let (one, many) = match self {
            Flat::None => (None, Vec::new()),
            Flat::One(v) => (Some(v), Vec::new()),
            Flat::Many(v) => (None, v),
        };
        one.into_iter().chain(many)
    }
}

pub trait SpliceFlat<T> {
    /// Replace the item at `index` with the contents of `flat`,
    /// returns how many items were put there.
    fn splice_flat(&mut self, index: usize, flat: Flat<T>) -> usize;
}

impl<T> SpliceFlat<T> for Vec<T> {
    fn splice_flat(&mut self, index: usize, flat: Flat<T>) -> usize {
        match flat {
            Flat::None => {
                self.remove(index);
                0
            }
            Flat::One(v) => {
                self[index] = v;
                1
            }
            Flat::Many(v) => {
                let n = v.len();
                self.splice(index..index + 1, v).for_each(drop);
                n
            }
        }
    }
}
