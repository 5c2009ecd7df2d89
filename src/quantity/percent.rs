quantity!(Percent, suffix: "%", precision: 2);
