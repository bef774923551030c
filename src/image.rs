/// Row-major 2D grid. `size` is `(width, height)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T: Copy> {
    pub data: Vec<T>,
    pub size: (usize, usize),
}

impl<T: Copy + Default> Image<T> {
    pub fn zero(size: (usize, usize)) -> Image<T> {
        Self::new_val(T::default(), size)
    }
}

impl<T: Copy> Image<T> {
    pub fn new(data: Vec<T>, size: (usize, usize)) -> Self {
        assert_eq!(data.len(), size.0 * size.1);
        Self { data, size }
    }

    pub fn new_val(data: T, size: (usize, usize)) -> Self {
        Self::new(vec![data; size.0 * size.1], size)
    }

    pub fn width(&self) -> usize {
        self.size.0
    }

    pub fn height(&self) -> usize {
        self.size.1
    }

    pub fn row(&self, y: usize) -> &[T] {
        let width = self.size.0;
        &self.data[y * width..(y + 1) * width]
    }

    pub fn iter_index(&self) -> impl Iterator<Item = (usize, usize)> {
        Range2d::new(self.size)
    }
}

impl<T: Copy> std::ops::Index<(usize, usize)> for Image<T> {
    type Output = T;
    fn index(&self, index: (usize, usize)) -> &T {
        if index.0 >= self.size.0 || index.1 >= self.size.1 {
            panic!("Index out of range: {:?} (size {:?})", index, self.size)
        }
        self.data.index(self.size.0 * index.1 + index.0)
    }
}

impl<T: Copy> std::ops::IndexMut<(usize, usize)> for Image<T> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut T {
        if index.0 >= self.size.0 || index.1 >= self.size.1 {
            panic!("Index out of range: {:?} (size {:?})", index, self.size)
        }
        self.data.index_mut(self.size.0 * index.1 + index.0)
    }
}

impl<'a, T: Copy> IntoIterator for &'a Image<T> {
    type Item = T;
    type IntoIter = std::iter::Cloned<std::slice::Iter<'a, T>>;
    fn into_iter(self) -> <Self as IntoIterator>::IntoIter {
        self.data.iter().cloned()
    }
}

struct Range2d {
    size: (usize, usize),
    cur: (usize, usize),
}

impl Range2d {
    fn new(size: (usize, usize)) -> Self {
        Self { size, cur: (0, 0) }
    }
}

impl Iterator for Range2d {
    type Item = (usize, usize);
    fn next(&mut self) -> Option<(usize, usize)> {
        if self.size.0 == 0 || self.cur.1 >= self.size.1 {
            None
        } else {
            let result = self.cur;
            self.cur.0 += 1;
            if self.cur.0 >= self.size.0 {
                self.cur.0 = 0;
                self.cur.1 += 1;
            }
            Some(result)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.size.0 * self.size.1 - (self.size.0 * self.cur.1 + self.cur.0);
        (size, Some(size))
    }
}
