/// Native samples are 16 bit; dividing by this maps 0..=65535 onto 0..=255.
pub const NATIVE_SCALE: u32 = 257;

const NATIVE_MAX: u32 = 0xffff;

/// One 8 bit RGBA sample. Color channels are alpha-premultiplied, the way the
/// codec layer hands them over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    pub const COLOR: [Channel; 3] = [Channel::R, Channel::G, Channel::B];
}

impl Pixel {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Converts 16 bit premultiplied channels down to 8 bit. Rounds toward zero.
    pub fn from_native(r: u32, g: u32, b: u32, a: u32) -> Self {
        Self {
            r: (r / NATIVE_SCALE) as u8,
            g: (g / NATIVE_SCALE) as u8,
            b: (b / NATIVE_SCALE) as u8,
            a: (a / NATIVE_SCALE) as u8,
        }
    }

    /// Premultiplies straight (non-premultiplied) 16 bit channels, then converts.
    pub fn from_straight16(r: u16, g: u16, b: u16, a: u16) -> Self {
        let a = u32::from(a);
        let premul = |c: u16| u32::from(c) * a / NATIVE_MAX;
        Self::from_native(premul(r), premul(g), premul(b), a)
    }

    /// Undoes premultiplication for encoders that store straight alpha.
    pub fn to_straight8(self) -> [u8; 4] {
        match self.a {
            255 => [self.r, self.g, self.b, 255],
            0 => [0, 0, 0, 0],
            a => {
                let a = u32::from(a);
                let unpremul = |c: u8| (u32::from(c) * 255 / a).min(255) as u8;
                [unpremul(self.r), unpremul(self.g), unpremul(self.b), a as u8]
            }
        }
    }
}

impl std::ops::Index<Channel> for Pixel {
    type Output = u8;
    fn index(&self, channel: Channel) -> &u8 {
        match channel {
            Channel::R => &self.r,
            Channel::G => &self.g,
            Channel::B => &self.b,
            Channel::A => &self.a,
        }
    }
}

impl std::ops::IndexMut<Channel> for Pixel {
    fn index_mut(&mut self, channel: Channel) -> &mut u8 {
        match channel {
            Channel::R => &mut self.r,
            Channel::G => &mut self.g,
            Channel::B => &mut self.b,
            Channel::A => &mut self.a,
        }
    }
}
